use pumpconsole::{logging::init_tracing, threads::main_task};

pub fn main() {
    init_tracing();

    match main_task() {
        Err(e) => println!("> [main] error {}", e),
        Ok(_) => println!("> [main] end"),
    }
}
