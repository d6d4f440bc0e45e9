use std::env;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

/// Persisted history in its camelCase wire layout, newest entry first.
pub fn legacy_history_fixture() -> &'static str {
    return r#"
[
  {
    "id": "1717171717999",
    "date": 1717171717999,
    "type": "INSTAGRAM",
    "preview": "https://instagram.com/p/XYZ",
    "result": {
      "emotionalCategory": ["Excited", "Accepting"],
      "explanation": "The audience reacts with enthusiasm.",
      "averageSentimentScore": 0.61,
      "caption": "Sunset over the bay",
      "sampleComments": ["so good", "wow"]
    }
  },
  {
    "id": "1717171717000",
    "date": 1717171717000,
    "type": "TEXT",
    "preview": "I really loved the new update, great work!",
    "result": {
      "scores": {
        "positive": 0.52,
        "neutral": 0.48,
        "negative": 0.0,
        "compound": 0.8
      },
      "explanation": "Strongly positive wording."
    }
  }
]
"#
    .trim();
}

/// Body returned by the analysis server for an Instagram post when it answers
/// in its native shape instead of the dashboard shape.
pub fn native_instagram_response_fixture() -> &'static str {
    return r#"
{
  "caption": "Launch day!",
  "avg_compound_score": 0.42,
  "interpretation": "The audience is mostly Excited and Curious about the launch, with a few Confused questions.",
  "plot": "iVBORw0KGgo="
}
"#
    .trim();
}
