fn main() -> anyhow::Result<()> {
    sujets_tui::cli::run()
}
