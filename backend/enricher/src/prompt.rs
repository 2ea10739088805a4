//! Prompt construction.

use theframe_catalog::is_placeholder;
use theframe_core::{ArtworkRecord, LlmRequest, MetadataField};

pub const SYSTEM_PROMPT: &str = "You are an art-history cataloguer. \
Given partial information about a painting, identify the artwork and answer \
with facts only. Use the painting's commonly used English title, the artist's \
full name, the century in Roman numerals (for example XVII), and the current \
location as museum, city, country. If you are not sure of a value, answer Unknown.";

const MAX_TOKENS: u32 = 400;
const TEMPERATURE: f32 = 0.2;

/// User prompt listing what is already known about `record`.
pub fn build_prompt(record: &ArtworkRecord) -> String {
    let mut known: Vec<(&str, &str)> = MetadataField::ALL
        .into_iter()
        .map(|field| (field_name(field), record.field(field)))
        .filter(|(_, value)| !is_placeholder(value))
        .collect();
    if let Some(style) = record.style.as_deref().filter(|s| !is_placeholder(s)) {
        known.push(("Style", style));
    }
    if let Some(year) = record.year.as_deref().filter(|y| !is_placeholder(y)) {
        known.push(("Year", year));
    }

    let mut prompt = String::from("Known information about the artwork:\n");
    if known.is_empty() {
        prompt.push_str("(nothing yet)\n");
    }
    for (label, value) in known {
        prompt.push_str(&format!("{label}: {value}\n"));
    }
    if let Some(file) = record.image.as_ref().and_then(|i| i.file_name()) {
        prompt.push_str(&format!("Image file: {file}\n"));
    }

    prompt.push_str(
        "\nReply with exactly these lines and nothing else:\n\
         Title: <title>\n\
         Author: <artist full name>\n\
         Century: <century>\n\
         Location: <museum, city, country>\n\
         Style: <art movement>\n\
         Year: <year completed>\n",
    );
    prompt
}

pub fn build_request(record: &ArtworkRecord, model: &str) -> LlmRequest {
    LlmRequest {
        model: model.to_string(),
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt: build_prompt(record),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

fn field_name(field: MetadataField) -> &'static str {
    match field {
        MetadataField::Title => "Title",
        MetadataField::Author => "Author",
        MetadataField::Century => "Century",
        MetadataField::Location => "Location",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use theframe_core::ImageRef;

    #[test]
    fn prompt_lists_known_fields_only() {
        let mut record = ArtworkRecord::new("a1");
        record.author = "Vermeer".into();
        record.century = "Unknown".into();
        record.image = ImageRef::parse("https://art.example.com/img/Vermeer%20-%20Girl.jpg");

        let prompt = build_prompt(&record);
        assert!(prompt.contains("Author: Vermeer\n"));
        assert!(!prompt.contains("Century: Unknown"));
        assert!(!prompt.contains("Title: \n"));
        assert!(prompt.contains("Image file: Vermeer%20-%20Girl.jpg"));
        assert!(prompt.contains("Location: <museum, city, country>"));
    }

    #[test]
    fn request_carries_model_and_system_prompt() {
        let request = build_request(&ArtworkRecord::new("a1"), "llama3.2:latest");
        assert_eq!(request.model, "llama3.2:latest");
        assert_eq!(request.system_prompt, SYSTEM_PROMPT);
        assert!(request.user_prompt.contains("(nothing yet)"));
    }
}
