use weber_core::{BlockMode, DotColor, StimulusPair};

/// Presentation side of a session. Calls arrive in the order the subject
/// should see them; implementations only draw.
pub trait View {
    fn paint_pair(&mut self, pair: &StimulusPair, color_a: DotColor, color_b: DotColor);
    fn clear_canvas(&mut self);
    fn show_get_ready(&mut self, practice: bool);
    fn show_mask(&mut self, color: DotColor);
    fn hide_mask(&mut self);
    fn show_question_text(&mut self, text: &str);
    fn show_continue_prompt(&mut self);
    fn hide_prompts(&mut self);
    fn show_key_guides(&mut self, first: &str, second: &str);
    /// `block` is the block about to start, labelled with its colors.
    fn show_block_complete_screen(&mut self, block: BlockMode, label_a: &str, label_b: &str);
    fn show_practice_complete_screen(&mut self, num_correct: u32, num_rounds: u32);
    fn show_finish_screen(&mut self, num_correct: u32);

    fn give_feedback(&mut self, _correct: bool) {}
}
