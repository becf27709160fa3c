use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = redcat_api::Args::parse();

	redcat_api::run(args).await
}
