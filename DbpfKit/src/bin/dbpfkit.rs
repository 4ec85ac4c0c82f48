fn main() -> anyhow::Result<()> {
    dbpfkit::cli::run_cli()
}
