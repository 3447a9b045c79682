//! Word wrapping and bubble sizing.

/// Sizing rules for bubbles drawn on the capture canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleMetrics {
    /// Maximum characters per wrapped line.
    pub line_budget: usize,
    /// Vertical distance between baselines.
    pub line_height: f32,
    /// Space added around the text block.
    pub padding: f32,
    /// Offset of the first baseline from the top of the bubble.
    pub first_baseline: f32,
    /// Width per character of the unwrapped text, for dialogue boxes.
    pub char_width: f32,
    /// Dialogue box width bounds.
    pub dialogue_min_width: f32,
    /// Dialogue box width bounds.
    pub dialogue_max_width: f32,
    /// Dialogue boxes are never shorter than this.
    pub dialogue_min_height: f32,
    /// How far the rounded corners bulge past the box sides.
    pub corner_radius: f32,
    /// Length of the dialogue tail.
    pub tail_length: f32,
    /// Thought bubble diameter bounds.
    pub thought_min_size: f32,
    /// Thought bubble diameter bounds.
    pub thought_max_size: f32,
}

impl Default for BubbleMetrics {
    fn default() -> Self {
        Self {
            line_budget: 15,
            line_height: 15.0,
            padding: 20.0,
            first_baseline: 20.0,
            char_width: 5.0,
            dialogue_min_width: 80.0,
            dialogue_max_width: 120.0,
            dialogue_min_height: 40.0,
            corner_radius: 10.0,
            tail_length: 10.0,
            thought_min_size: 40.0,
            thought_max_size: 80.0,
        }
    }
}

/// Greedy word wrap: a word joins the current line only if the line stays within
/// `budget` characters. A word longer than the budget sits alone on its line.
pub fn wrap_text(text: &str, budget: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= budget {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrapped dialogue text and the box it needs.
#[derive(Clone, Debug, PartialEq)]
pub struct DialogueLayout {
    /// Wrapped lines.
    pub lines: Vec<String>,
    /// Box width, before the rounded sides.
    pub width: f32,
    /// Box height.
    pub height: f32,
}

/// Wrapped thought text and the circle it needs.
#[derive(Clone, Debug, PartialEq)]
pub struct ThoughtLayout {
    /// Wrapped lines.
    pub lines: Vec<String>,
    /// Circle diameter.
    pub size: f32,
}

impl BubbleMetrics {
    /// Height of a dialogue box holding `line_count` lines.
    pub fn dialogue_height(&self, line_count: usize) -> f32 {
        self.text_block(line_count).max(self.dialogue_min_height)
    }

    /// Width of a dialogue box for text of `char_count` characters.
    pub fn dialogue_width(&self, char_count: usize) -> f32 {
        (char_count as f32 * self.char_width).clamp(self.dialogue_min_width, self.dialogue_max_width)
    }

    /// Diameter of a thought bubble holding `line_count` lines.
    pub fn thought_size(&self, line_count: usize) -> f32 {
        self.text_block(line_count)
            .clamp(self.thought_min_size, self.thought_max_size)
    }

    fn text_block(&self, line_count: usize) -> f32 {
        line_count as f32 * self.line_height + self.padding
    }

    /// Lays out a dialogue bubble.
    pub fn layout_dialogue(&self, text: &str) -> DialogueLayout {
        let lines = wrap_text(text, self.line_budget);
        DialogueLayout {
            width: self.dialogue_width(text.chars().count()),
            height: self.dialogue_height(lines.len()),
            lines,
        }
    }

    /// Lays out a thought bubble.
    pub fn layout_thought(&self, text: &str) -> ThoughtLayout {
        let lines = wrap_text(text, self.line_budget);
        ThoughtLayout {
            size: self.thought_size(lines.len()),
            lines,
        }
    }

    /// Baseline of line `index` relative to the bubble center, for a bubble of `height`.
    pub fn baseline(&self, height: f32, index: usize) -> f32 {
        -height / 2.0 + self.first_baseline + index as f32 * self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_sentence_wraps_within_twenty_chars() {
        let lines = wrap_text("This is a very long sentence that needs wrapping", 20);
        assert!(lines.len() > 1);
        assert_eq!(
            lines,
            vec!["This is a very long", "sentence that needs", "wrapping"]
        );
        for line in &lines {
            assert!(line.chars().count() <= 20, "{line:?}");
        }
    }

    #[test]
    fn overlong_word_sits_alone() {
        let lines = wrap_text("a supercalifragilisticexpialidocious b", 10);
        assert_eq!(lines, vec!["a", "supercalifragilisticexpialidocious", "b"]);
    }

    #[test]
    fn wrap_respects_budget_for_many_inputs() {
        let texts = [
            "",
            "one",
            "Hello there, how are you doing today my friend?",
            "I  can't   believe    it's not butter",
            "tiny words a b c d e f g h i j k l m n o p q r s t u v w x y z",
            "Pneumonoultramicroscopicsilicovolcanoconiosis is a word",
            "ünïcödé wörds çount as çharacters nöt bytes",
        ];
        for budget in [5, 10, 15, 20, 40] {
            for text in texts {
                let lines = wrap_text(text, budget);
                for line in &lines {
                    let len = line.chars().count();
                    assert!(
                        len <= budget || !line.contains(' '),
                        "budget {budget}: {line:?}"
                    );
                    assert!(!line.is_empty());
                }
                let rejoined = lines.join(" ");
                assert_eq!(rejoined, text.split_whitespace().collect::<Vec<_>>().join(" "));
            }
        }
    }

    #[test]
    fn empty_text_has_no_lines_and_minimum_boxes() {
        let metrics = BubbleMetrics::default();
        let dialogue = metrics.layout_dialogue("");
        assert!(dialogue.lines.is_empty());
        assert_eq!(dialogue.height, 40.0);
        assert_eq!(dialogue.width, 80.0);
        assert_eq!(metrics.layout_thought("").size, 40.0);
    }

    #[test]
    fn sizes_are_monotonic_and_bounded() {
        let metrics = BubbleMetrics::default();
        let mut last_height = 0.0;
        let mut last_size = 0.0;
        for lines in 0..20 {
            let height = metrics.dialogue_height(lines);
            let size = metrics.thought_size(lines);
            assert!(height >= last_height);
            assert!(size >= last_size);
            assert!(height >= metrics.dialogue_min_height);
            assert!((metrics.thought_min_size..=metrics.thought_max_size).contains(&size));
            last_height = height;
            last_size = size;
        }
        for chars in 0..100 {
            let width = metrics.dialogue_width(chars);
            assert!((metrics.dialogue_min_width..=metrics.dialogue_max_width).contains(&width));
        }
    }

    #[test]
    fn dialogue_dimensions_follow_text() {
        let metrics = BubbleMetrics::default();
        let layout = metrics.layout_dialogue("Where did everyone go this morning?");
        assert_eq!(layout.lines, vec!["Where did", "everyone go", "this morning?"]);
        assert_eq!(layout.height, 65.0);
        assert_eq!(layout.width, 120.0);
        assert_eq!(metrics.baseline(layout.height, 0), -12.5);
        assert_eq!(metrics.baseline(layout.height, 2), 17.5);
    }
}
