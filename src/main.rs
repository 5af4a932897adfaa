fn main() -> anyhow::Result<()> {
    cardlearn_lib::run()
}
