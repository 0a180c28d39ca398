fn main() -> anyhow::Result<()> {
    scmbridge::cli::run()
}
