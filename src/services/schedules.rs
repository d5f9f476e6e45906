//! Preventive-maintenance scheduling service.
//!
//! The due date is always derived as `last_done + frequency_days` and stored
//! alongside the inputs. Listings annotate each schedule with the days left
//! and an urgency bucket computed against the current date.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::schedule::{
        MaintenanceSchedule, MaintenanceStats, NewSchedule, ScheduleHistoryEntry, ScheduleInput,
        ScheduleWithStatus, UrgencyBucket,
    },
    repository::Repository,
};

/// Days-left threshold below which a schedule counts as due soon
const DUE_SOON_DAYS: i64 = 7;

#[derive(Clone)]
pub struct ScheduleService {
    repository: Repository,
}

impl ScheduleService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn create(
        &self,
        created_by: &str,
        request: ScheduleInput,
    ) -> AppResult<MaintenanceSchedule> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let (last_done, next_due) = derive_dates(&request)?;

        let schedule = self
            .repository
            .schedules
            .insert(NewSchedule {
                machine_id: request.machine_id,
                machine_name: request.machine_name,
                task: request.task,
                frequency_days: request.frequency_days,
                last_done,
                next_due,
                created_by: created_by.to_string(),
            })
            .await?;

        tracing::info!(schedule = schedule.id, task = %schedule.task, "schedule created");
        Ok(schedule)
    }

    pub async fn get(&self, id: i64) -> AppResult<MaintenanceSchedule> {
        self.repository
            .schedules
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Schedule {} not found", id)))
    }

    /// Full replace; the due date is re-derived from the new inputs
    pub async fn update(&self, id: i64, request: ScheduleInput) -> AppResult<MaintenanceSchedule> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let (last_done, next_due) = derive_dates(&request)?;

        let mut schedule = self.get(id).await?;
        if schedule.machine_id == request.machine_id
            && schedule.machine_name == request.machine_name
            && schedule.task == request.task
            && schedule.frequency_days == request.frequency_days
            && schedule.last_done == last_done
        {
            return Err(AppError::NoChange("No fields to update".to_string()));
        }
        schedule.machine_id = request.machine_id;
        schedule.machine_name = request.machine_name;
        schedule.task = request.task;
        schedule.frequency_days = request.frequency_days;
        schedule.last_done = last_done;
        schedule.next_due = next_due;

        if !self.repository.schedules.update(&schedule).await? {
            return Err(AppError::NotFound(format!("Schedule {} not found", id)));
        }
        Ok(schedule)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.repository.schedules.delete(id).await? {
            return Err(AppError::NotFound(format!("Schedule {} not found", id)));
        }
        Ok(())
    }

    /// All schedules annotated with days left and urgency
    pub async fn list_with_status(&self) -> AppResult<Vec<ScheduleWithStatus>> {
        let today = Utc::now().date_naive();
        let schedules = self.repository.schedules.list().await?;
        Ok(schedules
            .into_iter()
            .map(|s| {
                let days_left = days_until(s.next_due, today);
                ScheduleWithStatus {
                    id: s.id,
                    machine_name: s.machine_name,
                    task: s.task,
                    frequency_days: s.frequency_days,
                    last_done: s.last_done.format("%d %b %Y").to_string(),
                    next_due: s.next_due.format("%d %b %Y").to_string(),
                    days_left,
                    status: urgency(days_left),
                }
            })
            .collect())
    }

    /// Aggregate urgency counts over all schedules
    pub async fn stats(&self) -> AppResult<MaintenanceStats> {
        let today = Utc::now().date_naive();
        let schedules = self.repository.schedules.list().await?;

        let mut stats = MaintenanceStats {
            overdue_maintenance: 0,
            due_today: 0,
            upcoming_soon: 0,
            total_schedules: schedules.len() as i64,
        };
        for schedule in &schedules {
            let days = days_until(schedule.next_due, today);
            if days < 0 {
                stats.overdue_maintenance += 1;
            } else if days == 0 {
                stats.due_today += 1;
            } else if days <= DUE_SOON_DAYS {
                stats.upcoming_soon += 1;
            }
        }
        Ok(stats)
    }

    /// Completion history, most recently done first
    pub async fn history(&self, machine_id: Option<i64>) -> AppResult<Vec<ScheduleHistoryEntry>> {
        let now = Utc::now();
        let schedules = self.repository.schedules.list_history(machine_id).await?;
        Ok(schedules
            .into_iter()
            .map(|s| ScheduleHistoryEntry {
                id: s.id,
                machine_id: s.machine_id,
                machine_name: s.machine_name,
                task: s.task,
                frequency_days: s.frequency_days,
                last_done: s.last_done.format("%d %B %Y").to_string(),
                next_due: s.next_due.format("%d %B %Y").to_string(),
                status: if s.next_due > now {
                    "Completed".to_string()
                } else {
                    "Scheduled".to_string()
                },
            })
            .collect())
    }
}

fn derive_dates(request: &ScheduleInput) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    if request.frequency_days < 1 {
        return Err(AppError::Validation(
            "Frequency must be at least one day".to_string(),
        ));
    }
    let last_done = parse_last_done(&request.last_done)?;
    Ok((last_done, compute_next_due(last_done, request.frequency_days)))
}

/// Accepts an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
fn parse_last_done(input: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| AppError::Validation(format!("Invalid date: {}", input)))
}

fn compute_next_due(last_done: DateTime<Utc>, frequency_days: i32) -> DateTime<Utc> {
    last_done + Duration::days(frequency_days as i64)
}

fn days_until(next_due: DateTime<Utc>, today: NaiveDate) -> i64 {
    (next_due.date_naive() - today).num_days()
}

fn urgency(days_left: i64) -> UrgencyBucket {
    if days_left < 0 {
        UrgencyBucket::Overdue
    } else if days_left <= DUE_SOON_DAYS {
        UrgencyBucket::DueSoon
    } else {
        UrgencyBucket::OnTrack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(last_done: &str, frequency_days: i32) -> ScheduleInput {
        ScheduleInput {
            machine_id: 1,
            machine_name: "PRS-01 - Press Line 1".to_string(),
            task: "Grease main bearings".to_string(),
            frequency_days,
            last_done: last_done.to_string(),
        }
    }

    #[test]
    fn next_due_is_last_done_plus_frequency() {
        let last_done = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let next_due = compute_next_due(last_done, 30);
        assert_eq!(next_due.date_naive().to_string(), "2024-01-31");
    }

    #[test]
    fn parse_accepts_rfc3339_and_plain_dates() {
        let from_rfc = parse_last_done("2024-03-05T08:30:00Z").unwrap();
        assert_eq!(from_rfc.date_naive().to_string(), "2024-03-05");

        let from_date = parse_last_done("2024-03-05").unwrap();
        assert_eq!(from_date.date_naive().to_string(), "2024-03-05");

        assert!(parse_last_done("05/03/2024").is_err());
    }

    #[test]
    fn urgency_buckets() {
        assert_eq!(urgency(-1), UrgencyBucket::Overdue);
        assert_eq!(urgency(0), UrgencyBucket::DueSoon);
        assert_eq!(urgency(7), UrgencyBucket::DueSoon);
        assert_eq!(urgency(8), UrgencyBucket::OnTrack);
    }

    #[tokio::test]
    async fn create_persists_derived_due_date() {
        let service = ScheduleService::new(Repository::in_memory());
        let schedule = service
            .create("sari", input("2024-01-01", 30))
            .await
            .unwrap();
        assert_eq!(schedule.next_due.date_naive().to_string(), "2024-01-31");
        assert_eq!(schedule.created_by, "sari");
    }

    #[tokio::test]
    async fn create_rejects_non_positive_frequency() {
        let service = ScheduleService::new(Repository::in_memory());
        let err = service
            .create("sari", input("2024-01-01", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_rederives_due_date() {
        let service = ScheduleService::new(Repository::in_memory());
        let schedule = service
            .create("sari", input("2024-01-01", 30))
            .await
            .unwrap();

        let updated = service
            .update(schedule.id, input("2024-02-01", 14))
            .await
            .unwrap();
        assert_eq!(updated.next_due.date_naive().to_string(), "2024-02-15");

        let err = service.update(999, input("2024-02-01", 14)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .update(schedule.id, input("2024-02-01", 14))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoChange(_)));
    }

    #[test]
    fn days_left_against_a_fixed_date() {
        let next_due = compute_next_due(parse_last_done("2024-01-01").unwrap(), 30);
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let days_left = days_until(next_due, today);
        assert_eq!(days_left, -10);
        assert_eq!(urgency(days_left), UrgencyBucket::Overdue);
    }

    #[tokio::test]
    async fn overdue_schedule_is_bucketed_and_counted() {
        let service = ScheduleService::new(Repository::in_memory());
        // Long in the past, certainly overdue by now
        service
            .create("sari", input("2024-01-01", 30))
            .await
            .unwrap();

        let listed = service.list_with_status().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, UrgencyBucket::Overdue);
        assert!(listed[0].days_left < 0);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.overdue_maintenance, 1);
        assert_eq!(stats.total_schedules, 1);
    }

    #[tokio::test]
    async fn history_labels_past_due_as_scheduled() {
        let service = ScheduleService::new(Repository::in_memory());
        service
            .create("sari", input("2024-01-01", 30))
            .await
            .unwrap();
        let far_future = Utc::now() + Duration::days(10);
        service
            .create(
                "sari",
                input(&far_future.date_naive().to_string(), 30),
            )
            .await
            .unwrap();

        let history = service.history(None).await.unwrap();
        assert_eq!(history.len(), 2);
        // Most recently done first
        assert_eq!(history[0].status, "Completed");
        assert_eq!(history[1].status, "Scheduled");
    }
}
