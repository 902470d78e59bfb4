use super::pose::PoseId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const DEFAULT_HINT: &str = "Follow the reference pose and adjust slowly";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseInfo {
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub corrections: Vec<String>,
}

/// Presentation table for poses: display names, one-line descriptions used as
/// correction hints, and longer correction lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoseCatalog {
    poses: IndexMap<PoseId, PoseInfo>,
    default_hint: Option<String>,
}

impl PoseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pose(
        mut self,
        id: impl Into<PoseId>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        corrections: &[&str],
    ) -> Self {
        self.poses.insert(
            id.into(),
            PoseInfo {
                display_name: display_name.into(),
                description: description.into(),
                corrections: corrections.iter().map(|c| c.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_default_hint(mut self, hint: impl Into<String>) -> Self {
        self.default_hint = Some(hint.into());
        self
    }

    pub fn suryanamaskara() -> Self {
        Self::new()
            .with_pose(
                "pranamasana",
                "Pranamasana",
                "Prayer Pose - Stand with palms together at chest",
                &[
                    "Keep your palms together at chest level",
                    "Stand straight with feet together",
                    "Relax your shoulders",
                ],
            )
            .with_pose(
                "hasta utthanasana",
                "Hasta Utthanasana",
                "Raised Arms - Arms up, arch back slightly",
                &[
                    "Raise arms straight up",
                    "Arch your back slightly",
                    "Look up at your hands",
                ],
            )
            .with_pose(
                "padahastasana",
                "Padahastasana",
                "Forward Bend - Touch toes, bend forward",
                &[
                    "Bend forward from the hips",
                    "Try to touch your toes",
                    "Keep your legs straight",
                ],
            )
            .with_pose(
                "ashwa sanchalanasana",
                "Ashwa Sanchalanasana",
                "Lunge - One leg back, knee down",
                &[
                    "Step one leg back",
                    "Keep front knee at 90 degrees",
                    "Look up and arch your back",
                ],
            )
            .with_pose(
                "kumbhakasana",
                "Kumbhakasana",
                "Plank - Straight body like a plank",
                &[
                    "Keep body straight like a plank",
                    "Don't let hips sag",
                    "Engage your core",
                ],
            )
            .with_pose(
                "ashtanga namaskara",
                "Ashtanga Namaskara",
                "Eight Point Pose - Chest and knees down",
                &[
                    "Lower chest and knees to ground",
                    "Keep hips raised",
                    "Chin should touch the ground",
                ],
            )
            .with_pose(
                "bhujangasana",
                "Bhujangasana",
                "Cobra - Chest up, arms straight",
                &["Lift chest up", "Keep elbows slightly bent", "Look upward"],
            )
            .with_pose(
                "adho mukh svanasana",
                "Adho Mukh Svanasana",
                "Downward Dog - Inverted V shape",
                &[
                    "Form an inverted V shape",
                    "Push hips up and back",
                    "Keep heels down",
                ],
            )
    }

    pub fn get(&self, id: &PoseId) -> Option<&PoseInfo> {
        self.poses.get(id)
    }

    pub fn contains(&self, id: &PoseId) -> bool {
        self.poses.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Display name for a pose, title-casing the identifier when unknown.
    pub fn display_name(&self, id: &PoseId) -> String {
        match self.poses.get(id) {
            Some(info) => info.display_name.clone(),
            None => title_case(id.as_str()),
        }
    }

    /// Short correction hint keyed by target identity.
    pub fn hint(&self, id: &PoseId) -> &str {
        self.poses
            .get(id)
            .map(|info| info.description.as_str())
            .unwrap_or_else(|| self.default_hint.as_deref().unwrap_or(DEFAULT_HINT))
    }

    pub fn corrections(&self, id: &PoseId) -> &[String] {
        self.poses
            .get(id)
            .map(|info| info.corrections.as_slice())
            .unwrap_or(&[])
    }

    pub fn ids(&self) -> impl Iterator<Item = &PoseId> {
        self.poses.keys()
    }
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
