use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = redcat_ingest::Args::parse();

	redcat_ingest::run(args).await
}
