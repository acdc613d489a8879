fn main() {
    artifact_guard_lib::run()
}
