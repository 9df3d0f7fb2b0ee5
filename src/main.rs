mod bench;
mod cli;
mod dns;
mod domains;
mod error;
mod output;
mod resolver;
mod transport;

use anyhow::Context;
use clap::Parser;

use crate::bench::ResolverClient;
use crate::cli::Cli;
use crate::output::CsvSink;
use crate::transport::RunMetadata;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.log_level.into())
		.parse_default_env()
		.init();

	let target = resolver::target_config(cli.server, cli.port, cli.timeout)?;
	let meta = RunMetadata::new(&cli.label, &target);

	// Setup failures abort before any query is sent or row is written
	let domains = domains::read_domain_file(&cli.domains)?;
	let qtype_names: Vec<String> = cli.qtypes.iter().map(|t| t.to_string()).collect();
	output::log_config_summary(&target, &meta, domains.len(), &qtype_names, &cli.outfile);
	let mut sink = CsvSink::create(&cli.outfile)?;

	let client = ResolverClient::new(target);
	bench::run_benchmark(&client, &domains, &cli.qtypes, &meta, &mut sink)
		.await
		.context("benchmark run aborted")?;

	let path = sink.path().to_path_buf();
	let rows = sink.finish()?;
	println!("Wrote {} rows to {}", rows, path.display());

	Ok(())
}
