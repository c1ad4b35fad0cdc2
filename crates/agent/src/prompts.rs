//! Prompt construction for the movie-to-episodes workflow

/// System instruction fixed for every run
pub const SYSTEM_PROMPT: &str = r#"
You are a system that transforms movies into episodic series.

### Workflow:
1. Retrieve the subtitles of the movie using the `download_subtitles` tool.
2. Based on the user input (either a desired number of episodes OR desired episode length in minutes):
   - Split the movie into episodes.
   - Each episode must preserve narrative flow and maintain the spirit of the original movie.
   - Ensure timestamps (start and end) exactly align with the subtitle timestamps.
   - Provide a meaningful title and a short synopsis for each episode.

### Output format (strict JSON):
{
  "movie": {
    "title": "string",
    "runtime": "HH:MM:SS",
    "original_synopsis": "string"
  },
  "episodes": [
    {
      "episode_number": 1,
      "title": "string",
      "start_time": "HH:MM:SS",
      "end_time": "HH:MM:SS",
      "synopsis": "string"
    },
    ...
  ]
}

### Rules:
- Do not include full subtitles or script text in the output.
- All times must be in HH:MM:SS format.
- The number or length of episodes must follow the user request exactly.
- Episode boundaries must feel natural, respecting the story's pacing.
- **CRITICAL: NO SPOILERS in synopsis** - Write episode and general synopses that describe the setup, tone, and themes without revealing plot twists, endings, or major story developments.
"#;

/// Instruction appended after tool results, before the final completion
pub const FINAL_INSTRUCTION: &str =
    "Reply with a single JSON object in the output format above. \
     Do not request any further tool calls.";

/// Build the user prompt from the form inputs
pub fn build_user_prompt(
    title: &str,
    episodes: Option<u32>,
    episode_length_min: Option<u32>,
) -> String {
    if let Some(count) = episodes {
        return format!(
            "Split \"{}\" into {} episodes. each one at least 25 minutes long",
            title, count
        );
    }
    if let Some(minutes) = episode_length_min {
        return format!(
            "Split \"{}\" into episodes, each one is {} min long",
            title, minutes
        );
    }
    format!("Split \"{}\" into episodes", title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_with_episode_count() {
        let prompt = build_user_prompt("Inception", Some(5), None);
        assert_eq!(
            prompt,
            "Split \"Inception\" into 5 episodes. each one at least 25 minutes long"
        );
    }

    #[test]
    fn test_user_prompt_with_episode_length() {
        let prompt = build_user_prompt("Heat", None, Some(30));
        assert_eq!(prompt, "Split \"Heat\" into episodes, each one is 30 min long");
    }

    #[test]
    fn test_user_prompt_bare() {
        let prompt = build_user_prompt("Alien", None, None);
        assert_eq!(prompt, "Split \"Alien\" into episodes");
    }

    #[test]
    fn test_episode_count_takes_precedence() {
        let prompt = build_user_prompt("Alien", Some(3), Some(45));
        assert!(prompt.contains("3 episodes"));
    }

    #[test]
    fn test_system_prompt_names_the_tool() {
        assert!(SYSTEM_PROMPT.contains("download_subtitles"));
        assert!(SYSTEM_PROMPT.contains("strict JSON"));
    }
}
