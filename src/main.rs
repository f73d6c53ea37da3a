fn main() {
    ruleweave::cli::run();
}
