//! Built-in strategy records. Order matters: the first five are the default suggestions.

use super::{Strategy, StrategyCategory};

fn strategy(
    id: &str,
    title: &str,
    description: &str,
    category: StrategyCategory,
    time_to_complete: &str,
    steps: &[&str],
    mood_targets: &[&str],
) -> Strategy {
    Strategy {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category,
        time_to_complete: time_to_complete.to_string(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
        mood_targets: mood_targets.iter().map(|s| s.to_string()).collect(),
    }
}

pub(super) fn builtin_strategies() -> Vec<Strategy> {
    use StrategyCategory::*;

    vec![
        strategy(
            "box-breathing",
            "Box Breathing",
            "A steady four-count breath that slows the stress response.",
            Mindfulness,
            "4 min",
            &[
                "Breathe in through your nose for a count of four.",
                "Hold the breath for a count of four.",
                "Breathe out slowly for a count of four.",
                "Hold empty for a count of four, then repeat for four rounds.",
            ],
            &["anxious", "stressed", "overwhelmed", "angry"],
        ),
        strategy(
            "reframe-rejection",
            "Reframe the Rejection",
            "Separate what happened from what it says about you.",
            Cognitive,
            "10 min",
            &[
                "Write down the rejection in one neutral sentence.",
                "List the story you are telling yourself about it.",
                "Find two alternative explanations that do not involve your worth.",
                "Name one thing you would say to a friend in the same spot.",
            ],
            &["rejected", "hurt", "sad", "embarrassed"],
        ),
        strategy(
            "ten-minute-walk",
            "Ten-Minute Walk",
            "Gentle movement to release tension and reset attention.",
            Physical,
            "10 min",
            &[
                "Step outside or find a hallway you can pace.",
                "Walk at a comfortable pace and notice your footsteps.",
                "Let your arms swing loosely and drop your shoulders.",
            ],
            &["restless", "frustrated", "stuck", "angry"],
        ),
        strategy(
            "reach-out",
            "Reach Out to Someone Safe",
            "A short, low-pressure connection with someone who cares.",
            Social,
            "15 min",
            &[
                "Pick one person who usually leaves you feeling better.",
                "Send a simple message: you do not need to explain everything.",
                "Share one true sentence about how today is going.",
            ],
            &["lonely", "rejected", "sad"],
        ),
        strategy(
            "expressive-writing",
            "Expressive Writing",
            "Put the feeling on paper so it stops looping in your head.",
            Creative,
            "15 min",
            &[
                "Set a timer for ten minutes.",
                "Write continuously about what you feel without editing.",
                "Read it back once and underline one sentence that feels most true.",
            ],
            &["confused", "hurt", "frustrated", "sad"],
        ),
        strategy(
            "self-compassion-break",
            "Self-Compassion Break",
            "Meet the hard moment with the kindness you would offer a friend.",
            SelfCare,
            "5 min",
            &[
                "Acknowledge: this is a moment of suffering.",
                "Remind yourself that struggle is part of being human.",
                "Place a hand on your chest and offer yourself one kind phrase.",
            ],
            &["ashamed", "sad", "rejected", "disappointed"],
        ),
        strategy(
            "grounding-54321",
            "5-4-3-2-1 Grounding",
            "Anchor yourself in the present through your senses.",
            Mindfulness,
            "5 min",
            &[
                "Name five things you can see.",
                "Name four things you can touch.",
                "Name three things you can hear.",
                "Name two things you can smell.",
                "Name one thing you can taste.",
            ],
            &["anxious", "panicked", "overwhelmed"],
        ),
        strategy(
            "check-the-evidence",
            "Check the Evidence",
            "Test an anxious or self-critical thought against the facts.",
            Cognitive,
            "10 min",
            &[
                "Write the thought exactly as it sounds in your head.",
                "List the evidence for it and the evidence against it.",
                "Rewrite the thought so it fits all of the evidence.",
            ],
            &["anxious", "worried", "insecure"],
        ),
        strategy(
            "progressive-muscle-relaxation",
            "Progressive Muscle Relaxation",
            "Release physical tension one muscle group at a time.",
            Physical,
            "12 min",
            &[
                "Sit or lie down somewhere comfortable.",
                "Tense your feet for five seconds, then release.",
                "Work upward through legs, stomach, hands, arms, shoulders and face.",
                "Finish with three slow breaths.",
            ],
            &["tense", "stressed", "sleepless"],
        ),
        strategy(
            "body-scan",
            "Body Scan",
            "A slow sweep of attention from head to toe.",
            Mindfulness,
            "8 min",
            &[
                "Close your eyes and notice the top of your head.",
                "Move your attention slowly down through your body.",
                "Where you notice tension, breathe into it without trying to change it.",
            ],
            &["stressed", "numb", "tired"],
        ),
        strategy(
            "comfort-kit",
            "Build a Comfort Kit",
            "Gather small things that reliably soothe you.",
            SelfCare,
            "20 min",
            &[
                "Choose a box, bag or drawer.",
                "Add items for each sense: a scent, a texture, a photo, a song list, a snack.",
                "Keep it somewhere easy to reach on hard days.",
            ],
            &["sad", "lonely", "anxious"],
        ),
        strategy(
            "three-good-things",
            "Three Good Things",
            "Train attention toward what went right today.",
            Cognitive,
            "5 min",
            &[
                "Before bed, write down three things that went well today.",
                "Next to each, note why it happened.",
            ],
            &["discouraged", "flat", "sad"],
        ),
        strategy(
            "rest-and-recharge",
            "Rest and Recharge",
            "Give yourself explicit permission to pause.",
            SelfCare,
            "30 min",
            &[
                "Put your phone on do-not-disturb.",
                "Pick one restful activity: a nap, a bath, music or quiet reading.",
                "Notice how your body feels afterwards.",
            ],
            &["exhausted", "burned out", "tired", "stressed"],
        ),
    ]
}
