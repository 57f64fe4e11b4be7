fn main() {
    pk7_cli::main();
}
