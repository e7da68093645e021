use colored::{ColoredString, Colorize};
use livechat_core::{ChatMessage, Sender, WidgetConfig};
use livechat_session::ChatSnapshot;

/// Parse `#RRGGBB`; anything else falls back to the default blue.
pub fn accent(config: Option<&WidgetConfig>) -> (u8, u8, u8) {
    let color = config
        .map(WidgetConfig::primary_color)
        .unwrap_or(livechat_core::widget::DEFAULT_PRIMARY_COLOR);
    parse_hex(color).unwrap_or((0x3B, 0x82, 0xF6))
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn title(snapshot: &ChatSnapshot) -> ColoredString {
    let (r, g, b) = accent(snapshot.widget_config.as_ref());
    let title = snapshot
        .widget_config
        .as_ref()
        .map(WidgetConfig::title)
        .unwrap_or(livechat_core::widget::DEFAULT_TITLE);
    format!("💬 {title}").truecolor(r, g, b).bold()
}

pub fn print_message(message: &ChatMessage) {
    let label = match message.sender {
        Sender::User => "You:".cyan().bold(),
        Sender::Bot => "Assistant:".green().bold(),
        Sender::Agent => "Agent:".magenta().bold(),
        Sender::Unknown => "Notice:".dimmed(),
    };
    let content = match &message.file {
        Some(file) => format!("📎 {}", file.name),
        None => message.content.clone(),
    };
    println!("{label} {content}");
}

pub fn print_history(snapshot: &ChatSnapshot) {
    if snapshot.messages.is_empty() {
        println!("{}", "No messages yet".dimmed());
        return;
    }
    for message in &snapshot.messages {
        print_message(message);
    }
}

/// Options, input hints and the end-of-chat notice for the current state.
pub fn print_affordances(snapshot: &ChatSnapshot) {
    let options = snapshot.visible_options();
    if !options.is_empty() {
        println!("{}", "Options:".dimmed());
        for (index, option) in options.iter().enumerate() {
            println!("  {} {}", format!("[{}]", index + 1).yellow(), option.label);
        }
        println!("{}", "Pick one with /option <n>".dimmed());
    }
    if snapshot.has_ended {
        println!("{}", "The chat has ended. Use /reset to start over.".yellow());
    } else if snapshot.is_initialized && !snapshot.text_input_enabled() && !snapshot.is_loading {
        println!("{}", "Please send a file with /file <path> (JPG or PNG, max 5MB)".yellow());
    }
}

pub fn print_status(snapshot: &ChatSnapshot) {
    println!("{}", title(snapshot));
    match &snapshot.user {
        Some(user) => println!(
            "{}",
            format!("Signed in as {} ({})", user.name, user.phone).dimmed()
        ),
        None => println!("{}", "Not registered".dimmed()),
    }
    println!("{}", snapshot.phase.description().dimmed());
}

pub fn print_error(message: &str) {
    println!("{}", format!("❌ {message}").red());
}
