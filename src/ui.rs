pub const RED: &str = "\x1b[91m";
pub const GREEN: &str = "\x1b[92m";
pub const RESET: &str = "\x1b[0m";

pub fn print_reply(text: &str) {
    println!("{GREEN}{text}{RESET}\n");
}

pub fn operator_prompt() -> String {
    format!("{RED}> {RESET}")
}
