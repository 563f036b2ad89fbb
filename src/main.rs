fn main() -> anyhow::Result<()> {
    geotrack::logging::init();
    geotrack::cli::run()
}
