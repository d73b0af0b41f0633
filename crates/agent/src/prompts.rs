//! Prompt construction.
//!
//! Every template renders from a detached [`StateSnapshot`], never from the
//! live run state, so prompt rendering cannot alias a value a tool is about
//! to mutate.

use tera::{Context, Tera};

use liftline_core::schema;
use liftline_core::state::StateSnapshot;

use crate::errors::RunError;

const SUPERVISOR_TEMPLATE: &str = r#"You are a supervisor. Your goal is to manage the workflow to answer a user's question.

You have the following agents at your disposal:
- 'Meet performance analyst': queries the powerlifting database for meet results.
- 'Meet summary agent': formulates the final answer to the user.

The user's original query: '{{ input }}'

Data retrieved so far ({{ result_count }} rows):
{{ results_json }}

DECISION LOGIC:
- If this is NOT a powerlifting question: call 'route_to_agent' with 'Meet summary agent' and is_lifting_query=false.
- If this IS a powerlifting question AND we have no data: call 'route_to_agent' with 'Meet performance analyst'.
- If this IS a powerlifting question AND we have sufficient data: call 'route_to_agent' with 'Meet summary agent' and is_lifting_query=true.

You MUST always call the route_to_agent tool - never leave a query unanswered.

Think step by step and reason through your decision before calling the tool."#;

const SUMMARY_TEMPLATE: &str = r#"You are a meet summary agent. Your goal is to provide a comprehensive answer to the user's question.

Original user query: '{{ input }}'
{% if routing_reasoning %}Routing reasoning: {{ routing_reasoning }}{% endif %}

{% if is_lifting_query %}This is a powerlifting-related question. Here is the data retrieved:

Meet results:
{{ results_json }}

Provide a comprehensive answer based on this data. If the data is insufficient or empty, explain what information would be needed to answer the question properly.
{% else %}This is not a powerlifting-related question. Politely explain that you specialize in powerlifting data analysis, but still attempt to provide a useful response to the query if possible.
{% endif %}
Guidelines:
- Be conversational and friendly
- Provide specific details and numbers when available
- If data is missing or insufficient, explain what is needed"#;

/// Supervisor system prompt, carrying the current snapshot.
pub fn supervisor_system(snapshot: &StateSnapshot) -> Result<String, RunError> {
    render(SUPERVISOR_TEMPLATE, snapshot)
}

/// Summary prompt, carrying the snapshot and the classification outcome.
pub fn summary_prompt(snapshot: &StateSnapshot) -> Result<String, RunError> {
    render(SUMMARY_TEMPLATE, snapshot)
}

/// Analyst system prompt. Static text: the analyst sees the user question
/// as its prompt and everything else through the tool schema.
pub fn analyst_system() -> String {
    let columns: Vec<&str> = schema::names().collect();
    format!(
        "You are an expert powerlifting data analyst. Your only job is to answer user \
         questions by calling the \"get_meet_results\" tool. Convert the user's natural \
         language question into the structured parameters the tool expects. Do not add \
         any extra text, markdown, or commentary: your only output should be the tool call.\n\
         \n\
         The tool queries a database of powerlifting meet results. Each row represents one \
         lifter's performance at one competition.\n\
         \n\
         Column notes:\n\
         - Name: the lifter's name; duplicates carry a suffix (e.g. 'John Doe #1').\n\
         - Sex: 'M', 'F', or 'Mx'.\n\
         - Event: 'SBD' (full power), 'B' (bench-only), and similar codes.\n\
         - Equipment: 'Raw', 'Wraps', 'Single-ply', 'Multi-ply'.\n\
         - Attempt columns (Squat1Kg, Bench2Kg, ...): attempts in kg; negative means failed.\n\
         - Best3SquatKg / Best3BenchKg / Best3DeadliftKg: best successful attempt.\n\
         - TotalKg: sum of the three best lifts, present only when all three succeeded.\n\
         - Place: a number, or 'G' (guest), 'DQ', 'DD'.\n\
         - Dots, Wilks, Glossbrenner, Goodlift: relative-strength scores, higher is better.\n\
         - Date: meet start date, 'YYYY-MM-DD'.\n\
         - MeetCountry, MeetState, MeetTown, MeetName: where the meet happened.\n\
         \n\
         The full list of available columns is:\n{}\n\
         \n\
         For date ranges, infer bounds when the user names a month or year. For \"biggest\" \
         or \"best\" use orderBy with sortDirection 'DESC'; for \"smallest\" or \"worst\" use \
         'ASC'. Always set a limit.",
        columns.join(", ")
    )
}

fn render(template: &str, snapshot: &StateSnapshot) -> Result<String, RunError> {
    let context = Context::from_serialize(snapshot)
        .map_err(|error| RunError::Prompt(error.to_string()))?;
    Tera::one_off(template, &context, false).map_err(|error| RunError::Prompt(error.to_string()))
}

#[cfg(test)]
mod tests {
    use liftline_core::state::{RunState, TriggerInput};
    use serde_json::json;

    use super::{analyst_system, summary_prompt, supervisor_system};

    fn state(input: &str) -> RunState {
        RunState::new(TriggerInput {
            input: input.to_string(),
            thread_id: "t-1".to_string(),
            user_id: None,
            message_id: None,
        })
    }

    #[test]
    fn supervisor_prompt_carries_query_and_data() {
        let mut state = state("who had the biggest squat in houston?");
        state.set_results(vec![json!({"Name": "A", "Best3SquatKg": 300.0})]);

        let prompt = supervisor_system(&state.snapshot()).expect("render");
        assert!(prompt.contains("who had the biggest squat in houston?"));
        assert!(prompt.contains("1 rows"));
        assert!(prompt.contains("Best3SquatKg"));
        assert!(prompt.contains("route_to_agent"));
    }

    #[test]
    fn summary_prompt_takes_the_domain_path_when_classified() {
        let mut state = state("top 5 women's totals in USAPL");
        state.classify(Some(true), Some("asks about meet totals".to_string()));
        state.set_results(vec![json!({"Name": "B", "TotalKg": 540.0})]);

        let prompt = summary_prompt(&state.snapshot()).expect("render");
        assert!(prompt.contains("powerlifting-related question"));
        assert!(prompt.contains("TotalKg"));
        assert!(prompt.contains("asks about meet totals"));
    }

    #[test]
    fn summary_prompt_takes_the_apologetic_path_otherwise() {
        let mut state = state("what's the weather like?");
        state.classify(Some(false), None);

        let prompt = summary_prompt(&state.snapshot()).expect("render");
        assert!(prompt.contains("not a powerlifting-related question"));
        assert!(!prompt.contains("Here is the data retrieved"));
    }

    #[test]
    fn analyst_system_lists_every_column() {
        let system = analyst_system();
        assert!(system.contains("get_meet_results"));
        assert!(system.contains("Name, Sex, Event"));
        assert!(system.contains("Sanctioned"));
    }
}
