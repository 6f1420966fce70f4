use anyhow::Result;
use tracing::{debug, info};
use weber_core::{BlockMode, Canvas, DotColor, StimulusPair};
use weber_experiment::View;
use weber_experiment::prompts::{
    CONTINUE_PROMPT, GET_READY, PRACTICE, PRACTICE_COMPLETE, START_ASSESSMENT,
    block_complete_text, finish_text,
};
use weber_render::DotsRenderer;

/// Paints through the renderer and shows texts in the window title.
pub struct WindowView {
    renderer: DotsRenderer,
    screen: String,
    question: String,
    prompt: String,
    guides: String,
    feedback: Option<bool>,
    title_dirty: bool,
}

impl WindowView {
    pub fn new(canvas: &Canvas) -> Result<Self> {
        Ok(Self {
            renderer: DotsRenderer::new(1, 1, canvas)?,
            screen: "Press enter to start, escape to quit".to_string(),
            question: String::new(),
            prompt: String::new(),
            guides: String::new(),
            feedback: None,
            title_dirty: true,
        })
    }

    pub fn renderer_mut(&mut self) -> &mut DotsRenderer {
        &mut self.renderer
    }

    /// The window title, if it changed since the last call.
    pub fn take_title(&mut self) -> Option<String> {
        if !self.title_dirty {
            return None;
        }
        self.title_dirty = false;
        Some(self.title())
    }

    fn title(&self) -> String {
        let feedback = match self.feedback {
            Some(true) => "Correct!",
            Some(false) => "Wrong",
            None => "",
        };
        let parts = [
            self.screen.as_str(),
            self.question.as_str(),
            feedback,
            self.prompt.as_str(),
            self.guides.as_str(),
        ];
        let title = parts
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.replace('\n', " "))
            .collect::<Vec<_>>()
            .join(" | ");
        if title.is_empty() { "Weber".to_string() } else { title }
    }

    fn set_screen(&mut self, text: String) {
        info!(screen = %text.replace('\n', " "));
        self.screen = text;
        self.title_dirty = true;
    }
}

impl View for WindowView {
    fn paint_pair(&mut self, pair: &StimulusPair, color_a: DotColor, color_b: DotColor) {
        self.renderer.show_pair(pair, color_a, color_b);
        if self.feedback.take().is_some() {
            self.title_dirty = true;
        }
    }

    fn clear_canvas(&mut self) {
        self.renderer.clear();
    }

    fn show_get_ready(&mut self, practice: bool) {
        let text = if practice {
            format!("{PRACTICE}: {GET_READY}")
        } else {
            GET_READY.to_string()
        };
        self.set_screen(text);
    }

    fn show_mask(&mut self, color: DotColor) {
        self.renderer.show_mask(color);
    }

    fn hide_mask(&mut self) {
        self.renderer.clear();
    }

    fn show_question_text(&mut self, text: &str) {
        debug!(question = %text.replace('\n', " "));
        self.question = text.to_string();
        self.title_dirty = true;
    }

    fn show_continue_prompt(&mut self) {
        self.prompt = CONTINUE_PROMPT.to_string();
        self.title_dirty = true;
    }

    fn hide_prompts(&mut self) {
        self.screen.clear();
        self.question.clear();
        self.prompt.clear();
        self.title_dirty = true;
    }

    fn show_key_guides(&mut self, first: &str, second: &str) {
        self.guides = format!("{first}   {second}");
        self.title_dirty = true;
    }

    fn show_block_complete_screen(&mut self, block: BlockMode, label_a: &str, label_b: &str) {
        let text = block_complete_text(block, label_a, label_b);
        self.set_screen(format!("{text}\n{START_ASSESSMENT}"));
    }

    fn show_practice_complete_screen(&mut self, num_correct: u32, num_rounds: u32) {
        self.set_screen(format!(
            "{PRACTICE_COMPLETE} ({num_correct}/{num_rounds} correct)\n{START_ASSESSMENT}"
        ));
    }

    fn show_finish_screen(&mut self, num_correct: u32) {
        self.guides.clear();
        self.feedback = None;
        self.set_screen(format!("{}\nPress escape to exit", finish_text(num_correct)));
    }

    fn give_feedback(&mut self, correct: bool) {
        self.feedback = Some(correct);
        self.title_dirty = true;
    }
}
