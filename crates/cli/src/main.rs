fn main() -> Result<(), Box<dyn std::error::Error>> {
    symgraph_cli::run()
}
