//! Instruction text sent alongside every label image.
//!
//! The reply format is an agreement with the model only; responses are
//! forwarded without checking that they follow it.

/// Medication extraction instruction.
pub const MEDICATION_EXTRACTION_PROMPT: &str = "\
Task: Analyze this medication label/document image as an expert clinical pharmacist.
Extract ONLY the generic names of the medications.
Rules:
1. Ignore all numbers, dosages, instructions, and non-medication text.
2. Correct any obvious spelling mistakes from OCR.
3. Output EXACTLY a raw JSON array of strings containing the generic names in English, \
with no explanation and no markdown code fences.
Example output: [\"Aspirin\", \"Ibuprofen\"]";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_states_output_contract() {
        assert!(MEDICATION_EXTRACTION_PROMPT.contains("generic names"));
        assert!(MEDICATION_EXTRACTION_PROMPT.contains("raw JSON array"));
        assert!(MEDICATION_EXTRACTION_PROMPT.contains(r#"["Aspirin", "Ibuprofen"]"#));
    }
}
