//! Built-in example prompts ("prompt starters")

/// A titled example prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExamplePrompt {
    pub(crate) title: &'static str,
    pub(crate) prompt: &'static str,
}

pub(crate) const EXAMPLE_PROMPTS: &[ExamplePrompt] = &[
    ExamplePrompt {
        title: "Summarize Text",
        prompt: "Summarize the following article into three key bullet points:\n\n[Paste article text here]",
    },
    ExamplePrompt {
        title: "Generate Python Script",
        prompt: "Write a Python script that takes a directory path as a command-line argument and renames all .jpg files in that directory to have a \"vacation-\" prefix.",
    },
    ExamplePrompt {
        title: "Creative Writing",
        prompt: "Write a short story about a sentient robot that discovers music for the first time. The story should be set in a futuristic, dystopian city.",
    },
    ExamplePrompt {
        title: "Generate an Image",
        prompt: "A photorealistic image of a majestic red fox wearing a tiny steampunk top hat, sitting in a lush, green forest during golden hour.",
    },
    ExamplePrompt {
        title: "Time-Travel Story",
        prompt: "Write a short story about a time-traveling detective",
    },
    ExamplePrompt {
        title: "Explain Simply",
        prompt: "Explain quantum computing to a 10-year-old",
    },
    ExamplePrompt {
        title: "Recipe",
        prompt: "Create a recipe for a healthy breakfast smoothie",
    },
    ExamplePrompt {
        title: "Business Plan",
        prompt: "Generate a business plan for a coffee shop",
    },
    ExamplePrompt {
        title: "Poem",
        prompt: "Write a poem about the ocean at sunset",
    },
];

/// Example by its 1-based number as shown in listings
pub(crate) fn example(number: usize) -> Option<&'static ExamplePrompt> {
    number.checked_sub(1).and_then(|i| EXAMPLE_PROMPTS.get(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_is_one_based() {
        assert_eq!(example(1).map(|e| e.title), Some("Summarize Text"));
        assert_eq!(
            example(EXAMPLE_PROMPTS.len()).map(|e| e.title),
            Some("Poem")
        );
        assert!(example(0).is_none());
        assert!(example(EXAMPLE_PROMPTS.len() + 1).is_none());
    }

    #[test]
    fn test_examples_are_non_empty() {
        assert!(EXAMPLE_PROMPTS
            .iter()
            .all(|e| !e.title.is_empty() && !e.prompt.trim().is_empty()));
    }
}
