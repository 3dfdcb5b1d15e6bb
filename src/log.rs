use colored::Colorize;

fn print_log(tag: colored::ColoredString, text: String) {
    println!("{} {}", tag, text);
}

pub fn info(text: String) {
    print_log("[INFO]".cyan(), text);
}

pub fn warn(text: String) {
    print_log("[WARN]".yellow(), text);
}

pub fn success(text: String) {
    print_log("[OK]".green(), text);
}

pub fn error(text: String) {
    eprintln!("{} {}", "[ERROR]".red(), text);
}
