//! In-memory fakes for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use staywork_core::models::{
    Application, ApplicationStatus, Host, Image, ImageStatus, Notification, Opportunity,
    OpportunityKind, OpportunityLocation, OpportunityStats, OpportunityStatus, ReviewDetails,
    TimeSlot, TimeSlotStatus, User,
};
use staywork_core::{AppError, AppResult, Likelihood, SafeSearchResult, StorageBackend};
use staywork_db::{
    ApplicationFilter, ApplicationStore, HostStore, ImageStore, NotificationStore,
    OpportunitySearch, OpportunityStore, Page, StatField, UserStore,
};
use staywork_storage::{Bucket, ObjectStorage, StorageError, StorageResult};
use uuid::Uuid;

use crate::classifier::SafeSearchClassifier;
use crate::dispatch::{HostNotification, NotificationDispatch};
use crate::email::EmailSender;

pub fn clean_result() -> SafeSearchResult {
    SafeSearchResult {
        adult: Likelihood::VeryUnlikely,
        racy: Likelihood::VeryUnlikely,
        violence: Likelihood::VeryUnlikely,
        medical: Likelihood::VeryUnlikely,
        spoof: Likelihood::VeryUnlikely,
    }
}

pub fn sample_opportunity_with_slot(start: &str, end: &str) -> Opportunity {
    let now = Utc::now();
    let slot = TimeSlot {
        id: Uuid::new_v4(),
        start_date: start.parse().unwrap(),
        end_date: end.parse().unwrap(),
        default_capacity: 2,
        minimum_stay_days: 0,
        applied_count: 0,
        confirmed_count: 0,
        status: TimeSlotStatus::Open,
        description: None,
        capacity_overrides: Vec::new(),
    };
    Opportunity {
        id: Uuid::new_v4(),
        host_id: Uuid::new_v4(),
        title: "Organic farm stay".to_string(),
        slug: format!("organic-farm-stay-{}", Uuid::new_v4().simple()),
        public_id: Uuid::new_v4().simple().to_string(),
        description: "Help on an organic farm".to_string(),
        short_description: "Farm help".to_string(),
        status: OpportunityStatus::Active,
        status_note: None,
        kind: OpportunityKind::Farming,
        location: OpportunityLocation {
            address: None,
            city: "Toulouse".to_string(),
            country: "France".to_string(),
            coordinates: None,
        },
        stats: OpportunityStats::default(),
        time_slots: vec![slot],
        has_time_slots: true,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct InMemoryOpportunityStore {
    items: Mutex<HashMap<Uuid, Opportunity>>,
    last_search: Mutex<Option<OpportunitySearch>>,
}

impl InMemoryOpportunityStore {
    pub async fn seed(&self, opportunity: Opportunity) -> Opportunity {
        self.items
            .lock()
            .unwrap()
            .insert(opportunity.id, opportunity.clone());
        opportunity
    }

    pub fn last_search(&self) -> Option<OpportunitySearch> {
        self.last_search.lock().unwrap().clone()
    }
}

#[async_trait]
impl OpportunityStore for InMemoryOpportunityStore {
    async fn insert(&self, opportunity: &Opportunity) -> AppResult<()> {
        let mut items = self.items.lock().unwrap();
        if items
            .values()
            .any(|o| o.slug == opportunity.slug || o.public_id == opportunity.public_id)
        {
            return Err(AppError::Conflict(
                "unique constraint violated: slug".to_string(),
            ));
        }
        items.insert(opportunity.id, opportunity.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Opportunity> {
        self.items
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("opportunity not found".to_string()))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OpportunityStatus,
        note: Option<&str>,
    ) -> AppResult<()> {
        let mut items = self.items.lock().unwrap();
        let opportunity = items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("opportunity not found".to_string()))?;
        opportunity.status = status;
        opportunity.status_note = note.map(str::to_string);
        opportunity.updated_at = Utc::now();
        Ok(())
    }

    async fn search(&self, query: &OpportunitySearch) -> AppResult<Page<Opportunity>> {
        *self.last_search.lock().unwrap() = Some(query.clone());
        let items: Vec<Opportunity> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.status == OpportunityStatus::Active)
            .filter(|o| query.kind.map_or(true, |k| o.kind == k))
            .filter(|o| {
                query
                    .city
                    .as_ref()
                    .map_or(true, |c| o.location.city.eq_ignore_ascii_case(c))
            })
            .filter(|o| {
                query
                    .country
                    .as_ref()
                    .map_or(true, |c| o.location.country.eq_ignore_ascii_case(c))
            })
            .cloned()
            .collect();
        let total = items.len() as i64;
        Ok(Page { items, total })
    }

    async fn bump_stat(&self, id: Uuid, field: StatField, delta: i64) -> AppResult<()> {
        let mut items = self.items.lock().unwrap();
        let opportunity = items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("opportunity not found".to_string()))?;
        let counter = match field {
            StatField::Views => &mut opportunity.stats.views,
            StatField::Applications => &mut opportunity.stats.applications,
            StatField::Bookmarks => &mut opportunity.stats.bookmarks,
        };
        *counter = (*counter + delta).max(0);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryApplicationStore {
    items: Mutex<HashMap<Uuid, Application>>,
}

impl InMemoryApplicationStore {
    pub async fn count(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn insert(&self, application: &Application) -> AppResult<()> {
        self.items
            .lock()
            .unwrap()
            .insert(application.id, application.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Application> {
        self.items
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("application not found".to_string()))
    }

    async fn list(
        &self,
        filter: &ApplicationFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Page<Application>> {
        let mut items: Vec<Application> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|a| filter.user_id.map_or(true, |u| a.user_id == u))
            .filter(|a| filter.opportunity_id.map_or(true, |o| a.opportunity_id == o))
            .filter(|a| filter.host_id.map_or(true, |h| a.host_id == h))
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = items.len() as i64;
        let items = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        note: Option<&str>,
        review: &ReviewDetails,
    ) -> AppResult<()> {
        let mut items = self.items.lock().unwrap();
        let application = items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("application not found".to_string()))?;
        application.status = status;
        application.status_note = note.map(str::to_string);
        application.review = review.clone();
        application.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.items
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("application not found".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryImageStore {
    items: Mutex<HashMap<Uuid, Image>>,
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn insert(&self, image: &Image) -> AppResult<()> {
        self.items.lock().unwrap().insert(image.id, image.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Image> {
        self.items
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("image not found".to_string()))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ImageStatus,
        public_url: Option<&str>,
    ) -> AppResult<()> {
        let mut items = self.items.lock().unwrap();
        let image = items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("image not found".to_string()))?;
        image.status = status;
        image.public_url = public_url.map(str::to_string);
        image.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory object storage with injectable copy failure.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<(Bucket, String), Vec<u8>>>,
    ops: AtomicUsize,
    fail_next_copy: AtomicBool,
}

impl InMemoryStorage {
    pub fn contains(&self, bucket: Bucket, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket, key.to_string()))
    }

    /// Number of storage operations performed so far.
    pub fn op_count(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }

    pub fn fail_next_copy(&self) {
        self.fail_next_copy.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .insert((bucket, key.to_string()), data);
        Ok(())
    }

    async fn get(&self, bucket: Bucket, key: &str) -> StorageResult<Vec<u8>> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket, key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn copy(
        &self,
        src_bucket: Bucket,
        src_key: &str,
        dst_bucket: Bucket,
        dst_key: &str,
    ) -> StorageResult<()> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_copy.swap(false, Ordering::SeqCst) {
            return Err(StorageError::CopyFailed("injected copy failure".to_string()));
        }
        let mut objects = self.objects.lock().unwrap();
        let data = objects
            .get(&(src_bucket, src_key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(src_key.to_string()))?;
        objects.insert((dst_bucket, dst_key.to_string()), data);
        Ok(())
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> StorageResult<()> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket, key.to_string()));
        Ok(())
    }

    async fn exists(&self, bucket: Bucket, key: &str) -> StorageResult<bool> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        Ok(self.contains(bucket, key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://test.local/public/{}", key)
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Classifier fake returning a fixed result or a fixed failure.
pub struct FakeClassifier {
    result: Option<SafeSearchResult>,
}

impl FakeClassifier {
    pub fn returning(result: SafeSearchResult) -> Self {
        Self {
            result: Some(result),
        }
    }

    pub fn failing() -> Self {
        Self { result: None }
    }
}

#[async_trait]
impl SafeSearchClassifier for FakeClassifier {
    async fn classify(&self, _image: &[u8]) -> AppResult<SafeSearchResult> {
        self.result.clone().ok_or_else(|| {
            AppError::ExternalService("classifier unavailable".to_string())
        })
    }
}

#[derive(Default)]
pub struct RecordingDispatch {
    messages: Mutex<Vec<HostNotification>>,
}

impl RecordingDispatch {
    pub fn messages(&self) -> Vec<HostNotification> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationDispatch for RecordingDispatch {
    fn enqueue(&self, notification: HostNotification) {
        self.messages.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
pub struct InMemoryHostStore {
    items: Mutex<HashMap<Uuid, Host>>,
}

impl InMemoryHostStore {
    pub async fn seed_host(&self) -> Host {
        let now = Utc::now();
        let host = Host {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Ferme du Lac".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        self.items.lock().unwrap().insert(host.id, host.clone());
        host
    }
}

#[async_trait]
impl HostStore for InMemoryHostStore {
    async fn get(&self, id: Uuid) -> AppResult<Host> {
        self.items
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("host not found".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    items: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub async fn seed_user(&self, email: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Test User".to_string(),
            created_at: Utc::now(),
        };
        self.items.lock().unwrap().insert(user.id, user.clone());
        user
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, id: Uuid) -> AppResult<User> {
        self.items
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryNotificationStore {
    items: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<()> {
        self.items.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Notification>> {
        let mut items: Vec<Notification> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut items = self.items.lock().unwrap();
        let notification = items
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("notification not found".to_string()))?;
        notification.is_read = true;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let mut count = 0;
        for notification in self.items.lock().unwrap().iter_mut() {
            if notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                count += 1;
            }
        }
        Ok(count)
    }
}

pub struct FailingEmailSender;

#[async_trait]
impl EmailSender for FailingEmailSender {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> AppResult<()> {
        Err(AppError::ExternalService("smtp down".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}
