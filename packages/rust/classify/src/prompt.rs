//! HFACS classification prompt.

/// Placeholder replaced with the narrative text.
const NARRATIVE_SLOT: &str = "{narrative_text}";

const HFACS_PROMPT_TEMPLATE: &str = r#"**Project Context & Goal:**

We are classifying incident narratives from the Aviation Safety Reporting System (ASRS) into the Human Factors Analysis and Classification System (HFACS) framework, to identify the human factors that contributed to each incident consistently and at scale. Act as an expert aviation safety analyst.

**Understanding HFACS:**

HFACS is a hierarchical framework used to identify human error in aviation incidents. It categorizes failures across four main levels:
1.  **Unsafe Acts of Operators:** Errors (Skill-Based, Decision, Perceptual) and Violations (Routine, Exceptional) committed by front-line personnel.
2.  **Preconditions for Unsafe Acts:** Latent conditions in the operator or environment (Environmental Factors: Physical, Technological; Condition of Operators: Adverse Mental/Physiological States, Physical/Mental Limitations; Personnel Factors: CRM, Personal Readiness).
3.  **Unsafe Supervision:** Failures by direct supervisors (Inadequate Supervision, Planned Inappropriate Operations, Failure to Correct Known Problem, Supervisory Violations).
4.  **Organizational Influences:** High-level systemic failures (Resource Management, Organizational Climate, Operational Process).

**Your Task: HFACS Classification for the following narrative:**

Narrative:
---
{narrative_text}
---

Please:
1.  Carefully read and analyze the narrative text provided above.
2.  Identify all relevant contributing factors according to the HFACS framework. An incident can, and often will, have multiple HFACS categories applicable.
3.  For each identified HFACS category, provide the specific sub-category where possible (e.g., instead of just "Errors," specify "Skill-Based Errors" or "Decision Errors").
4.  Output your classification for THIS SINGLE INCIDENT NARRATIVE in the following JSON format (provide only the JSON list of classifications, nothing else):

**Desired JSON Output Format (a list of classification objects):**
```json
[
  {
    "level": "Unsafe Acts of Operators",
    "category": "Errors",
    "sub_category": "Skill-Based Errors",
    "justification_from_narrative": "Brief quote or summary from the narrative supporting this classification."
  },
  {
    "level": "Preconditions for Unsafe Acts",
    "category": "Environmental Factors",
    "sub_category": "Physical Environment",
    "justification_from_narrative": "Quote/summary supporting this."
  }
]
```

**Few-Shot Examples to Guide Your Classification:**

**Example 1:**
*Narrative Snippet:* "During preflight, I misread the fuel gauge due to poor lighting in the hangar and the gauge's small font. I was also feeling rushed because we were behind schedule."
*Expected JSON Output for this example:*
```json
[
  {
    "level": "Unsafe Acts of Operators",
    "category": "Errors",
    "sub_category": "Perceptual Errors",
    "justification_from_narrative": "Pilot misread the fuel gauge."
  },
  {
    "level": "Preconditions for Unsafe Acts",
    "category": "Environmental Factors",
    "sub_category": "Physical Environment",
    "justification_from_narrative": "Poor lighting in the hangar."
  },
  {
    "level": "Preconditions for Unsafe Acts",
    "category": "Environmental Factors",
    "sub_category": "Technological Environment",
    "justification_from_narrative": "Gauge's small font."
  },
  {
    "level": "Preconditions for Unsafe Acts",
    "category": "Condition of Operators",
    "sub_category": "Adverse Mental States",
    "justification_from_narrative": "Feeling rushed because we were behind schedule."
  }
]
```

**Example 2:**
*Narrative Snippet:* "The company procedure for a go-around was unclear in the ops manual, and my First Officer seemed hesitant to speak up despite my obvious confusion during the critical phase of flight. Our training on this specific scenario was minimal."
*Expected JSON Output for this example:*
```json
[
  {
    "level": "Unsafe Acts of Operators",
    "category": "Errors",
    "sub_category": "Decision Errors",
    "justification_from_narrative": "Obvious confusion during a critical phase implies difficulty in decision-making."
  },
  {
    "level": "Preconditions for Unsafe Acts",
    "category": "Personnel Factors",
    "sub_category": "Crew Resource Management Issues",
    "justification_from_narrative": "First Officer seemed hesitant to speak up."
  },
  {
    "level": "Unsafe Supervision",
    "category": "Inadequate Supervision",
    "justification_from_narrative": "Training on this specific scenario was minimal (implies supervisory oversight of training adequacy)."
  },
  {
    "level": "Organizational Influences",
    "category": "Operational Process",
    "justification_from_narrative": "Company procedure for a go-around was unclear in the ops manual."
  }
]
```

Now, please provide the JSON list of classifications ONLY for the main narrative provided under "Your Task".
"#;

/// Build the full prompt for one narrative.
pub fn render(narrative: &str) -> String {
    HFACS_PROMPT_TEMPLATE.replacen(NARRATIVE_SLOT, narrative, 1)
}
