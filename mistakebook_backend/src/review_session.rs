//! The client side of a review run, independent of any UI framework.
//!
//! A `ReviewSession` walks through the due queue one question at a time.
//! Network access goes through `ReviewApi`; a rating is submitted in two
//! halves (`begin_rating` and `finish_rating`) so that a UI can keep the
//! session in `Submitting` while the request is in flight and refuse
//! further ratings meanwhile. `rate` does both halves in one go.

use super::*;
use crate::review::Rating;
use serde::{Serialize, Deserialize};
use std::collections::{BTreeSet, VecDeque};

/// A due question as the review screen shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub question_id: i32,
    pub title: String,
    pub text: String,
    pub answer: String,
    pub notes: String,
    pub subject_name: Option<String>,
    pub image_urls: Vec<String>,
}

impl From<QuestionWithRelations> for ReviewCard {
    fn from(q: QuestionWithRelations) -> ReviewCard {
        ReviewCard {
            question_id: q.question.id,
            title: q.question.title,
            text: q.question.text,
            answer: q.question.answer,
            notes: q.question.notes,
            subject_name: q.subject.map(|s| s.name),
            image_urls: q.images.into_iter().map(|i| i.url).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RefreshTarget {
    DueQuestions,
    Stats,
    MasteredList,
}

pub trait ReviewApi {
    fn due_questions(&mut self) -> Result<Vec<ReviewCard>>;
    fn submit_rating(&mut self, question_id: i32, rating: Rating) -> Result<()>;
    fn refresh(&mut self, target: RefreshTarget) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Browsing,
    Reviewing { answer_revealed: bool },
    Submitting { rating: Rating },
    Complete,
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
    state: ReviewState,
    queue: VecDeque<ReviewCard>,
    error: Option<String>,
    pending_refreshes: BTreeSet<RefreshTarget>,
}

impl Default for ReviewSession {
    fn default() -> ReviewSession {
        ReviewSession::new()
    }
}

impl ReviewSession {
    pub fn new() -> ReviewSession {
        ReviewSession {
            state: ReviewState::Browsing,
            queue: VecDeque::new(),
            error: None,
            pending_refreshes: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.as_str())
    }

    pub fn pending_refreshes(&self) -> impl Iterator<Item = &RefreshTarget> {
        self.pending_refreshes.iter()
    }

    /// The question on screen, if a review is running.
    pub fn current(&self) -> Option<&ReviewCard> {
        match self.state {
            ReviewState::Reviewing { .. } | ReviewState::Submitting { .. } => self.queue.front(),
            ReviewState::Browsing | ReviewState::Complete => None,
        }
    }

    pub fn answer_revealed(&self) -> bool {
        match self.state {
            ReviewState::Reviewing { answer_revealed } => answer_revealed,
            ReviewState::Submitting { .. } => true,
            _ => false,
        }
    }

    fn in_review(&self) -> bool {
        match self.state {
            ReviewState::Reviewing { .. } | ReviewState::Submitting { .. } => true,
            _ => false,
        }
    }

    /// Fetches the due queue. A failure leaves an empty queue and sets the error banner.
    pub fn load<A: ReviewApi>(&mut self, api: &mut A) -> Result<()> {
        if self.in_review() {
            bail!(ErrorKind::ReviewState("can't reload the queue during a review"));
        }
        self.state = ReviewState::Browsing;
        match api.due_questions() {
            Ok(cards) => {
                debug!("Loaded {} due questions.", cards.len());
                self.queue = cards.into();
                self.pending_refreshes.remove(&RefreshTarget::DueQuestions);
            }
            Err(e) => {
                warn!("Couldn't load due questions: {}", e);
                self.queue.clear();
                self.error = Some(e.to_string());
            }
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.in_review() {
            bail!(ErrorKind::ReviewState("a review is already running"));
        }
        if self.queue.is_empty() {
            bail!(ErrorKind::ReviewState("nothing is due"));
        }
        self.state = ReviewState::Reviewing { answer_revealed: false };
        Ok(())
    }

    pub fn reveal(&mut self) -> Result<()> {
        match self.state {
            ReviewState::Reviewing { .. } => {
                self.state = ReviewState::Reviewing { answer_revealed: true };
                Ok(())
            }
            _ => bail!(ErrorKind::ReviewState("no question to reveal")),
        }
    }

    /// Moves into `Submitting` and returns the question to submit the rating for.
    pub fn begin_rating(&mut self, rating: Rating) -> Result<i32> {
        match self.state {
            ReviewState::Reviewing { .. } => (),
            ReviewState::Submitting { .. } => bail!(ErrorKind::ReviewState("a rating is already being submitted")),
            _ => bail!(ErrorKind::ReviewState("no question to rate")),
        }
        let question_id = match self.queue.front() {
            Some(card) => card.question_id,
            None => bail!(ErrorKind::ReviewState("the queue is empty")),
        };
        self.state = ReviewState::Submitting { rating };
        Ok(question_id)
    }

    /// Applies the outcome of a submission started with `begin_rating`.
    pub fn finish_rating(&mut self, outcome: Result<()>) -> Result<()> {
        match self.state {
            ReviewState::Submitting { .. } => (),
            _ => bail!(ErrorKind::ReviewState("no rating is being submitted")),
        }

        match outcome {
            Ok(()) => {
                self.queue.pop_front();
                if self.queue.is_empty() {
                    self.state = ReviewState::Complete;
                    self.pending_refreshes.insert(RefreshTarget::Stats);
                    self.pending_refreshes.insert(RefreshTarget::MasteredList);
                } else {
                    self.state = ReviewState::Reviewing { answer_revealed: false };
                }
            }
            Err(e) => {
                warn!("Submitting a rating failed: {}", e);
                self.error = Some(e.to_string());
                self.state = ReviewState::Reviewing { answer_revealed: true };
            }
        }
        Ok(())
    }

    /// Submits a rating for the current question and, when that empties the
    /// queue, refreshes the dashboards.
    pub fn rate<A: ReviewApi>(&mut self, api: &mut A, rating: Rating) -> Result<()> {
        let question_id = self.begin_rating(rating)?;
        let outcome = api.submit_rating(question_id, rating);
        self.finish_rating(outcome)?;
        if self.state == ReviewState::Complete {
            self.run_refreshes(api);
        }
        Ok(())
    }

    /// Leaves the review. What is left of the queue is dropped, not skipped.
    pub fn exit<A: ReviewApi>(&mut self, api: &mut A) -> Result<()> {
        if let ReviewState::Submitting { .. } = self.state {
            bail!(ErrorKind::ReviewState("wait for the rating to be submitted"));
        }
        self.queue.clear();
        self.state = ReviewState::Browsing;
        self.pending_refreshes.insert(RefreshTarget::DueQuestions);
        self.pending_refreshes.insert(RefreshTarget::Stats);
        self.run_refreshes(api);
        Ok(())
    }

    /// Runs the pending refreshes; the ones that fail stay pending.
    pub fn run_refreshes<A: ReviewApi>(&mut self, api: &mut A) {
        let targets: Vec<RefreshTarget> = self.pending_refreshes.iter().cloned().collect();
        for target in targets {
            match api.refresh(target) {
                Ok(()) => {
                    self.pending_refreshes.remove(&target);
                }
                Err(e) => {
                    warn!("Refreshing {:?} failed: {}", target, e);
                    self.error = Some(e.to_string());
                }
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
#[derive(Default)]
struct FakeApi {
    due: Vec<ReviewCard>,
    fail_load: bool,
    fail_submit: bool,
    fail_refresh: bool,
    submitted: Vec<(i32, Rating)>,
    refreshed: Vec<RefreshTarget>,
}

#[cfg(test)]
impl ReviewApi for FakeApi {
    fn due_questions(&mut self) -> Result<Vec<ReviewCard>> {
        if self.fail_load {
            bail!("network down");
        }
        Ok(self.due.clone())
    }

    fn submit_rating(&mut self, question_id: i32, rating: Rating) -> Result<()> {
        if self.fail_submit {
            bail!("server said no");
        }
        self.submitted.push((question_id, rating));
        Ok(())
    }

    fn refresh(&mut self, target: RefreshTarget) -> Result<()> {
        if self.fail_refresh {
            bail!("refresh failed");
        }
        self.refreshed.push(target);
        Ok(())
    }
}

#[cfg(test)]
fn card(question_id: i32) -> ReviewCard {
    ReviewCard {
        question_id,
        title: format!("Q{}", question_id),
        text: "What is 6 × 7?".into(),
        answer: "42".into(),
        notes: "48".into(),
        subject_name: Some("数学".into()),
        image_urls: vec![],
    }
}

#[cfg(test)]
fn loaded(ids: &[i32]) -> (ReviewSession, FakeApi) {
    let mut api = FakeApi { due: ids.iter().map(|&id| card(id)).collect(), ..FakeApi::default() };
    let mut session = ReviewSession::new();
    session.load(&mut api).unwrap();
    (session, api)
}

#[test]
fn test_full_review_run() {
    let (mut session, mut api) = loaded(&[1, 2]);
    assert_eq!(session.queue_len(), 2);
    assert_eq!(session.state(), ReviewState::Browsing);
    assert!(session.current().is_none());

    session.start().unwrap();
    assert_eq!(session.current().map(|c| c.question_id), Some(1));
    assert!(!session.answer_revealed());

    session.reveal().unwrap();
    assert!(session.answer_revealed());

    session.rate(&mut api, Rating::Good).unwrap();
    assert_eq!(session.current().map(|c| c.question_id), Some(2));
    assert_eq!(session.state(), ReviewState::Reviewing { answer_revealed: false });
    assert!(api.refreshed.is_empty());

    session.rate(&mut api, Rating::Again).unwrap();
    assert_eq!(session.state(), ReviewState::Complete);
    assert!(session.current().is_none());
    assert_eq!(api.submitted, vec![(1, Rating::Good), (2, Rating::Again)]);
    assert_eq!(api.refreshed, vec![RefreshTarget::Stats, RefreshTarget::MasteredList]);
    assert_eq!(session.pending_refreshes().count(), 0);
}

#[test]
fn test_start_with_empty_queue() {
    let (mut session, _api) = loaded(&[]);
    assert!(session.start().is_err());
    assert_eq!(session.state(), ReviewState::Browsing);
}

#[test]
fn test_load_failure_sets_banner() {
    let mut api = FakeApi { due: vec![card(1)], fail_load: true, ..FakeApi::default() };
    let mut session = ReviewSession::new();
    session.load(&mut api).unwrap();
    assert_eq!(session.queue_len(), 0);
    assert!(session.error().is_some());
    session.dismiss_error();
    assert!(session.error().is_none());
}

#[test]
fn test_no_double_submit() {
    let (mut session, _api) = loaded(&[1, 2]);
    session.start().unwrap();
    assert_eq!(session.begin_rating(Rating::Easy).unwrap(), 1);
    assert_eq!(session.state(), ReviewState::Submitting { rating: Rating::Easy });
    assert!(session.begin_rating(Rating::Hard).is_err());
    assert!(session.reveal().is_err());
    assert_eq!(session.state(), ReviewState::Submitting { rating: Rating::Easy });

    session.finish_rating(Ok(())).unwrap();
    assert_eq!(session.current().map(|c| c.question_id), Some(2));
    assert!(session.finish_rating(Ok(())).is_err());
}

#[test]
fn test_failed_submit_keeps_question() {
    let (mut session, mut api) = loaded(&[1, 2]);
    api.fail_submit = true;
    session.start().unwrap();
    session.reveal().unwrap();
    session.rate(&mut api, Rating::Hard).unwrap();
    assert!(session.error().is_some());
    assert_eq!(session.current().map(|c| c.question_id), Some(1));
    assert_eq!(session.queue_len(), 2);
    assert_eq!(session.state(), ReviewState::Reviewing { answer_revealed: true });

    api.fail_submit = false;
    session.rate(&mut api, Rating::Hard).unwrap();
    assert_eq!(session.current().map(|c| c.question_id), Some(2));
}

#[test]
fn test_rate_outside_review() {
    let (mut session, mut api) = loaded(&[1]);
    assert!(session.rate(&mut api, Rating::Good).is_err());
    assert!(session.reveal().is_err());
    assert!(api.submitted.is_empty());
}

#[test]
fn test_exit_discards_queue() {
    let (mut session, mut api) = loaded(&[1, 2, 3]);
    session.start().unwrap();
    session.rate(&mut api, Rating::Good).unwrap();
    session.exit(&mut api).unwrap();
    assert_eq!(session.state(), ReviewState::Browsing);
    assert_eq!(session.queue_len(), 0);
    assert_eq!(api.submitted, vec![(1, Rating::Good)]);
    assert_eq!(api.refreshed, vec![RefreshTarget::DueQuestions, RefreshTarget::Stats]);
}

#[test]
fn test_failed_refresh_stays_pending() {
    let (mut session, mut api) = loaded(&[1]);
    api.fail_refresh = true;
    session.start().unwrap();
    session.rate(&mut api, Rating::Easy).unwrap();
    assert_eq!(session.state(), ReviewState::Complete);
    assert!(session.error().is_some());
    assert_eq!(session.pending_refreshes().count(), 2);

    api.fail_refresh = false;
    session.run_refreshes(&mut api);
    assert_eq!(session.pending_refreshes().count(), 0);
}

#[test]
fn test_review_card_from_question() {
    use chrono::{TimeZone, Utc};
    let now = Utc.ymd(2026, 10, 16).and_hms(9, 0, 0);
    let question = Question {
        id: 5,
        user_id: 1,
        subject_id: 2,
        title: "Derivative".into(),
        text: "d/dx x²".into(),
        answer: "2x".into(),
        notes: "x".into(),
        difficulty: "3".into(),
        status: STATUS_PENDING.into(),
        created_at: now,
        updated_at: now,
        repetitions: 0,
        interval_days: 0,
        ease: 2.5,
        next_review: now,
        last_reviewed: None,
    };
    let image = QuestionImage { id: 9, user_id: 1, question_id: Some(5), url: "/img/9.png".into(), created_at: now };
    let card = ReviewCard::from(QuestionWithRelations { question, subject: None, images: vec![image] });
    assert_eq!(card.question_id, 5);
    assert_eq!(card.answer, "2x");
    assert_eq!(card.subject_name, None);
    assert_eq!(card.image_urls, vec!["/img/9.png".to_string()]);
}
