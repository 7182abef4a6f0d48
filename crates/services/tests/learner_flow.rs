use std::sync::Arc;

use prep_core::model::{ActionTarget, DisasterType, DrillError, Level, ModuleKey, Needs};
use prep_core::quiz::QuizError;
use prep_core::time::fixed_clock;
use services::{
    AppServices, DrillServiceError, QuizAdvance, QuizResult, QuizService, QuizServiceError,
    ReplySource,
};
use storage::repository::{InMemoryStore, Storage};

fn services_over(kv: &InMemoryStore) -> AppServices {
    let storage = Storage::from_store(Arc::new(kv.clone()));
    AppServices::from_storage(&storage, fixed_clock(), None).expect("services")
}

/// Answers the first `correct` questions right and the rest wrong.
async fn play(quiz: &QuizService, level: Level, correct: usize) -> QuizResult {
    let mut session = quiz.start_quiz(level).await.expect("start");
    let mut answered = 0;
    loop {
        let question = session.current_question().expect("question");
        let right = question.correct();
        let option = if answered < correct {
            right
        } else {
            (right + 1) % question.options().len()
        };
        let feedback = quiz.answer(&mut session, option).expect("answer");
        assert_eq!(feedback.is_correct, answered < correct);
        answered += 1;

        match quiz.advance(&mut session).await.expect("advance") {
            QuizAdvance::Next(view) => assert_eq!(view.number, answered + 1),
            QuizAdvance::Finished(result) => return result,
        }
    }
}

#[tokio::test]
async fn four_of_five_passes_level_one() {
    let kv = InMemoryStore::new();
    let services = services_over(&kv);
    let level_one = Level::FIRST;

    let result = play(&services.quiz(), level_one, 4).await;
    assert_eq!(result.outcome.percent, 80);
    assert!(result.outcome.passed);
    assert_eq!(result.unlocked_level.value(), 2);
    assert_eq!(
        kv.snapshot().unwrap()["quiz"],
        r#"{"unlockedLevel":2,"scores":{"1":80}}"#
    );

    let stats = services.learning().stats().await.unwrap();
    assert_eq!(stats.average_quiz_score, 80);
}

#[tokio::test]
async fn locked_level_and_answer_rules() {
    let kv = InMemoryStore::new();
    let quiz = services_over(&kv).quiz();

    let err = quiz.start_quiz(Level::LAST).await.unwrap_err();
    assert!(matches!(err, QuizServiceError::Quiz(QuizError::Locked(_))));

    let mut session = quiz.start_quiz(Level::FIRST).await.unwrap();
    assert!(matches!(
        quiz.advance(&mut session).await,
        Err(QuizServiceError::Quiz(QuizError::Unanswered))
    ));
    quiz.answer(&mut session, 0).unwrap();
    let score = session.score();
    assert!(matches!(
        quiz.answer(&mut session, 1),
        Err(QuizServiceError::Quiz(QuizError::AlreadyAnswered))
    ));
    assert_eq!(session.score(), score);
    assert_eq!(kv.write_count(), 0);
}

#[tokio::test]
async fn drill_counts_only_complete_runs() {
    let kv = InMemoryStore::new();
    let drills = services_over(&kv).drills();

    let mut session = drills.start(DisasterType::Earthquake);
    for i in 0..3 {
        session.toggle_step(i).unwrap();
    }
    assert!(matches!(
        drills.complete(&mut session).await,
        Err(DrillServiceError::Drill(DrillError::Incomplete { remaining: 1 }))
    ));
    assert_eq!(kv.write_count(), 0);

    session.toggle_step(3).unwrap();
    let outcome = drills.complete(&mut session).await.unwrap();
    assert_eq!(outcome.drills_completed, 1);
    assert_eq!(kv.snapshot().unwrap()["drillsCompleted"], "1");
}

#[tokio::test]
async fn chat_answers_offline() {
    let kv = InMemoryStore::new();
    let assistant = services_over(&kv).assistant();

    let reply = assistant.submit("what about earthquake safety".to_string());
    let reply = reply.wait().await.expect("reply");
    assert_eq!(reply.source, ReplySource::Knowledge);
    assert_eq!(
        reply.action.map(|a| a.target),
        Some(ActionTarget::OpenModule(ModuleKey::Earthquake))
    );

    let reply = assistant.respond("how do volcanoes work").await;
    assert!(matches!(
        reply.action.map(|a| a.target),
        Some(ActionTarget::WebSearch(_))
    ));
}

#[tokio::test]
async fn progress_survives_a_restart() {
    let kv = InMemoryStore::new();
    {
        let services = services_over(&kv);
        play(&services.quiz(), Level::FIRST, 5).await;
        services
            .learning()
            .complete_module(ModuleKey::Earthquake)
            .await
            .unwrap();
        services.learning().save_profile(Needs::Hearing).await.unwrap();
    }

    let services = services_over(&kv);
    let levels = services.quiz().levels().await.unwrap();
    assert!(levels[1].unlocked);
    assert_eq!(levels[0].score, Some(100));

    let record = services.progress().load().await.unwrap();
    assert_eq!(record.profile.needs, Needs::Hearing);
    assert!(record.modules.is_completed(ModuleKey::Earthquake));

    services.progress().save(&record).await.unwrap();
    assert_eq!(services.progress().load().await.unwrap(), record);
}
