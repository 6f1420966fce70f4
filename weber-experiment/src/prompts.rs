//! English texts shown between and during trials.

use weber_core::{BlockMode, ColorPair};

pub const GET_READY: &str = "Get ready!";
pub const PRACTICE: &str = "PRACTICE";
pub const CONTINUE_PROMPT: &str = "Press space to continue";
pub const PRACTICE_COMPLETE: &str = "Practice complete!\nReady to start?";
pub const START_ASSESSMENT: &str = "Press enter to start the assessment";

pub fn question_text(block: BlockMode, colors: &ColorPair, yes_key_is_first: bool) -> String {
    let (a, b) = (colors.a.name, colors.b.name);
    match block {
        BlockMode::MoreThanHalf => {
            let (yes, no) = if yes_key_is_first { ("F", "J") } else { ("J", "F") };
            format!(
                "If {a} is greater in number, press {yes};\nif {b} is greater in number, press {no}."
            )
        }
        other => format!("Is {a} {} of the total?", other.label()),
    }
}

/// Labels for the first (`F`) and second (`J`) key.
pub fn key_guides(yes_key_is_first: bool) -> (&'static str, &'static str) {
    if yes_key_is_first {
        ("F = Yes", "J = No")
    } else {
        ("F = No", "J = Yes")
    }
}

pub fn block_complete_text(block: BlockMode, label_a: &str, label_b: &str) -> String {
    format!(
        "Block complete!\nNext block: {} ({label_a} vs {label_b})",
        block.label()
    )
}

pub fn finish_text(num_correct: u32) -> String {
    format!("You did it!\nYou earned {num_correct} points!")
}
