//! Built-in content: quiz questions, drill steps, chat knowledge, module
//! reading material and emergency contacts.

use crate::model::{
    ActionTarget, DisasterType, EmergencyContact, KnowledgeBase, KnowledgeEntry, LearningModule,
    Level, ModuleKey, ModuleSection, Question, QuestionBank, QuestionError, Region,
    SuggestedAction,
};

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

struct QuestionDef {
    level: u8,
    prompt: &'static str,
    options: &'static [&'static str],
    correct: usize,
}

const QUESTIONS: &[QuestionDef] = &[
    QuestionDef {
        level: 1,
        prompt: "What should you do during an earthquake?",
        options: &["Run outside", "Drop, Cover, and Hold On", "Stand near a window"],
        correct: 1,
    },
    QuestionDef {
        level: 1,
        prompt: "Which number reaches the fire service in India?",
        options: &["100", "108", "101"],
        correct: 2,
    },
    QuestionDef {
        level: 1,
        prompt: "During a fire in a tall building you should use:",
        options: &["The elevator", "The stairs", "The roof"],
        correct: 1,
    },
    QuestionDef {
        level: 1,
        prompt: "Which item belongs in an emergency kit?",
        options: &["Torch with spare batteries", "Board games", "Perfume"],
        correct: 0,
    },
    QuestionDef {
        level: 1,
        prompt: "During a flood you should move to:",
        options: &["The basement", "Higher ground", "The riverbank"],
        correct: 1,
    },
    QuestionDef {
        level: 2,
        prompt: "If your clothes catch fire you should:",
        options: &["Run", "Stop, Drop, and Roll", "Jump"],
        correct: 1,
    },
    QuestionDef {
        level: 2,
        prompt: "Moving flood water 15 cm deep can:",
        options: &["Wash a car", "Knock you down", "Do nothing"],
        correct: 1,
    },
    QuestionDef {
        level: 2,
        prompt: "After an earthquake, the first thing to check for is:",
        options: &["Gas leaks", "Phone messages", "TV signal"],
        correct: 0,
    },
    QuestionDef {
        level: 2,
        prompt: "A room is filling with smoke. You should:",
        options: &["Stand up and run", "Stay low and crawl to the exit", "Open every window"],
        correct: 1,
    },
    QuestionDef {
        level: 2,
        prompt: "Drinking water after a flood should be:",
        options: &["Boiled or purified", "Taken from the flood", "Stored in the open"],
        correct: 0,
    },
    QuestionDef {
        level: 3,
        prompt: "NDMA stands for:",
        options: &[
            "National Disaster Management Authority",
            "National Defence Medical Association",
            "None of these",
        ],
        correct: 0,
    },
    QuestionDef {
        level: 3,
        prompt: "The top priority right after an earthquake is:",
        options: &["Checking for injuries", "Posting on social media", "Rearranging furniture"],
        correct: 0,
    },
    QuestionDef {
        level: 3,
        prompt: "India's single emergency number is:",
        options: &["911", "112", "999"],
        correct: 1,
    },
    QuestionDef {
        level: 3,
        prompt: "A class A fire extinguisher is meant for:",
        options: &["Ordinary combustibles like wood and paper", "Electrical fires", "Cooking oil"],
        correct: 0,
    },
    QuestionDef {
        level: 3,
        prompt: "An emergency kit should hold water for at least:",
        options: &["6 hours", "3 days", "1 month"],
        correct: 1,
    },
];

/// The built-in question bank.
///
/// # Errors
///
/// Returns `QuestionError` if a built-in question is malformed.
pub fn question_bank() -> Result<QuestionBank, QuestionError> {
    build_bank(QUESTIONS)
}

fn build_bank(defs: &[QuestionDef]) -> Result<QuestionBank, QuestionError> {
    defs.iter().try_fold(QuestionBank::new(), |bank, def| {
        let level = Level::new(def.level)?;
        let options = def.options.iter().map(|o| (*o).to_string()).collect();
        let question = Question::new(def.prompt, options, def.correct)?;
        Ok(bank.with_question(level, question))
    })
}

//
// ─── DRILLS ────────────────────────────────────────────────────────────────────
//

/// The four steps of a drill, in order.
#[must_use]
pub fn drill_steps(disaster: DisasterType) -> [&'static str; 4] {
    match disaster {
        DisasterType::Earthquake => [
            "Drop to your hands and knees",
            "Take cover under a sturdy table",
            "Hold on until the shaking stops",
            "Evacuate calmly to the open assembly point",
        ],
        DisasterType::Fire => [
            "Raise the alarm",
            "Stay low below the smoke",
            "Leave by the stairs, not the elevator",
            "Gather at the assembly point and report",
        ],
        DisasterType::Flood => [
            "Switch off electricity and gas",
            "Pack the emergency kit",
            "Move to higher ground",
            "Avoid walking or driving through water",
        ],
    }
}

//
// ─── KNOWLEDGE ─────────────────────────────────────────────────────────────────
//

/// Chat knowledge in priority order.
#[must_use]
pub fn knowledge_base() -> KnowledgeBase {
    let open = |label: &str, key| Some(SuggestedAction::new(label, ActionTarget::OpenModule(key)));
    let drill =
        |label: &str, kind| Some(SuggestedAction::new(label, ActionTarget::StartDrill(kind)));
    let contacts = Some(SuggestedAction::new(
        "View emergency contacts",
        ActionTarget::EmergencyContacts,
    ));

    KnowledgeBase::new(vec![
        KnowledgeEntry::new(
            "earthquake",
            "During an earthquake: Drop, Cover, and Hold On. Stay away from windows and \
             heavy furniture. Once the shaking stops, check for injuries and gas leaks.",
            open("Open Earthquake module", ModuleKey::Earthquake),
        ),
        KnowledgeEntry::new(
            "flood",
            "In a flood, move to higher ground immediately. Never walk or drive through \
             moving water; 15 cm can knock you down. Boil water before drinking.",
            open("Open Flood module", ModuleKey::Flood),
        ),
        KnowledgeEntry::new(
            "fire",
            "If there is a fire, raise the alarm and get out. Stay low under smoke and use \
             the stairs, never the elevator. If your clothes catch fire: Stop, Drop, and Roll.",
            open("Open Fire module", ModuleKey::Fire),
        ),
        KnowledgeEntry::new(
            "cyclone",
            "Before a cyclone, secure loose objects, stock water and food, and follow \
             evacuation orders. Stay indoors away from windows until the all-clear.",
            None,
        ),
        KnowledgeEntry::new(
            "heat",
            "In a heatwave, drink water often, avoid the sun between 12 and 3 pm, and \
             watch for dizziness or confusion, which are signs of heat stroke.",
            None,
        ),
        KnowledgeEntry::new(
            "first aid",
            "For bleeding, apply firm pressure with a clean cloth. For burns, cool with \
             running water for 20 minutes. Call 108 for an ambulance.",
            None,
        ),
        KnowledgeEntry::new(
            "kit",
            "An emergency kit needs water for 3 days, dry food, a torch, spare batteries, \
             a first-aid box, medicines, copies of documents and a whistle.",
            None,
        ),
        KnowledgeEntry::new(
            "drill",
            "Practising regularly builds muscle memory. Try the earthquake drill to \
             rehearse Drop, Cover, and Hold On.",
            drill("Start Earthquake drill", DisasterType::Earthquake),
        ),
        KnowledgeEntry::new(
            "number",
            "Dial 112 for any emergency, 101 for fire, 108 for an ambulance and 100 for \
             police. Your state disaster authority also runs a helpline.",
            contacts.clone(),
        ),
        KnowledgeEntry::new(
            "help",
            "If you are in danger right now, call 112. You can also look up your state's \
             disaster management helpline.",
            contacts,
        ),
    ])
}

//
// ─── MODULES ───────────────────────────────────────────────────────────────────
//

const MODULES: [LearningModule; 3] = [
    LearningModule {
        key: ModuleKey::Earthquake,
        title: "Earthquake Safety",
        summary: "Drop, Cover, and Hold On. Stay away from windows.",
        sections: &[
            ModuleSection {
                heading: "Before",
                items: &["Secure heavy furniture to walls", "Prepare an emergency kit"],
            },
            ModuleSection {
                heading: "After",
                items: &["Check for injuries", "Watch for gas leaks and aftershocks"],
            },
        ],
    },
    LearningModule {
        key: ModuleKey::Flood,
        title: "Flood Response",
        summary: "Move to higher ground. Do not drive through water.",
        sections: &[ModuleSection {
            heading: "After",
            items: &["Avoid standing water", "Boil water before drinking"],
        }],
    },
    LearningModule {
        key: ModuleKey::Fire,
        title: "Fire Safety",
        summary: "Stop, Drop, and Roll. Use stairs, not elevators.",
        sections: &[ModuleSection {
            heading: "Prevention",
            items: &["Test smoke alarms monthly", "Keep exits clear"],
        }],
    },
];

#[must_use]
pub fn module(key: ModuleKey) -> &'static LearningModule {
    match key {
        ModuleKey::Earthquake => &MODULES[0],
        ModuleKey::Flood => &MODULES[1],
        ModuleKey::Fire => &MODULES[2],
    }
}

#[must_use]
pub fn modules() -> &'static [LearningModule] {
    &MODULES
}

//
// ─── CONTACTS ──────────────────────────────────────────────────────────────────
//

const NATIONAL_HELPLINES: &[EmergencyContact] = &[
    EmergencyContact {
        name: "National Emergency",
        number: "112",
    },
    EmergencyContact {
        name: "Fire",
        number: "101",
    },
    EmergencyContact {
        name: "Ambulance",
        number: "108",
    },
    EmergencyContact {
        name: "Police",
        number: "100",
    },
    EmergencyContact {
        name: "NDMA Helpline",
        number: "1078",
    },
];

#[must_use]
pub fn national_helplines() -> &'static [EmergencyContact] {
    NATIONAL_HELPLINES
}

#[must_use]
pub fn regional_contacts(region: Region) -> &'static [EmergencyContact] {
    match region {
        Region::Punjab => &[EmergencyContact {
            name: "Punjab SDMA",
            number: "0172-2740274",
        }],
        Region::Delhi => &[EmergencyContact {
            name: "Delhi SDMA",
            number: "1077",
        }],
        Region::Haryana => &[EmergencyContact {
            name: "Haryana SDMA",
            number: "1070",
        }],
        Region::Maharashtra => &[EmergencyContact {
            name: "Maharashtra SDMA",
            number: "022-22027990",
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LevelError;

    #[test]
    fn bank_has_five_questions_per_level() {
        let bank = question_bank().unwrap();
        for level in Level::all() {
            assert_eq!(bank.question_count(level), 5, "level {level}");
        }
    }

    #[test]
    fn out_of_range_level_is_an_error() {
        let defs = [QuestionDef {
            level: 4,
            prompt: "Q",
            options: &["a", "b"],
            correct: 0,
        }];
        assert_eq!(
            build_bank(&defs).unwrap_err(),
            QuestionError::Level(LevelError::OutOfRange(4))
        );
    }

    #[test]
    fn every_drill_has_four_steps() {
        for kind in DisasterType::ALL {
            assert_eq!(drill_steps(kind).len(), 4);
        }
    }

    #[test]
    fn module_lookup_matches_key() {
        for key in ModuleKey::ALL {
            assert_eq!(module(key).key, key);
        }
    }

    #[test]
    fn knowledge_prefers_earthquake_over_flood() {
        let kb = knowledge_base();
        let reply = kb.respond("earthquake and flood");
        assert_eq!(reply.matched.as_deref(), Some("earthquake"));
        let reply = kb.respond("flood and earthquake");
        assert_eq!(reply.matched.as_deref(), Some("earthquake"));
    }

    #[test]
    fn knowledge_matches_inside_sentence() {
        let reply = knowledge_base().respond("what about earthquake safety");
        assert_eq!(reply.matched.as_deref(), Some("earthquake"));
    }

    #[test]
    fn every_region_has_a_contact() {
        for region in Region::ALL {
            assert!(!regional_contacts(region).is_empty());
        }
    }
}
