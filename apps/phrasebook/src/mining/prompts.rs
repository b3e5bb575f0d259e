// Report mining LLM prompt templates.

pub use crate::llm_client::prompts::JSON_ARRAY_ONLY_SYSTEM as MINING_SYSTEM;

pub const MINING_PROMPT_TEMPLATE: &str = r#"You are an expert RICS Surveyor building a comprehensive phrase library.

YOUR TASK:
1. Read the survey report text below
2. Extract all key observations about building elements and their condition
3. ANONYMIZE them (remove specific addresses, postcodes, client names, dates, property numbers)
4. GENERALIZE them (e.g., "12 High Street" becomes "the property", specific dates become "recently")
5. CLASSIFY each phrase (Section, Element, Condition Rating 1-3)
6. INFER property age, style and type from clues in the report
7. Cross-check against the reference material to ensure accuracy

REFERENCE MATERIAL (Building Standards):
{kb_context}

CLASSIFICATION GUIDE:
- Section: Choose ONE: {sections}
- Element: What building part? "Roof", "Walls", "Windows", "Electrical", etc.
- Sub_Section: What aspect? "Condition", "Defects", "Materials", "Safety"
- Condition_Rating: 1=Good, 2=Fair, 3=Poor
- Property_Style: One of: {styles}
- Property_Type: One of: {types}
- Property_Age: One of: {ages}

OUTPUT INSTRUCTIONS:
Return ONLY a JSON array with NO markdown, NO explanation.
Each object must have all these keys:
[
    {
        "Section": "External",
        "Element": "Chimney Stacks",
        "Sub_Section": "Defects",
        "Content": "The chimney stack shows signs of deterioration with mortar joints in poor condition.",
        "Condition_Rating": "2",
        "Property_Style": "Semi-Detached",
        "Property_Type": "Traditional",
        "Property_Age": "1900-1918"
    },
    {
        "Section": "Internal",
        "Element": "Walls",
        "Sub_Section": "Condition",
        "Content": "Internal walls are finished with plaster and paint in reasonable condition.",
        "Condition_Rating": "2",
        "Property_Style": "Semi-Detached",
        "Property_Type": "Traditional",
        "Property_Age": "1900-1918"
    }
]

REPORT TEXT TO MINE:
{report_text}

Remember: Return ONLY the JSON array. No other text."#;
