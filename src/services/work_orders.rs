//! Work order lifecycle service.
//!
//! Covers creation with sequential numbering, the exclusive claim protocol,
//! role- and ownership-gated status changes, and the archive/restore flow.
//! `authorize_status_change` holds the whole permission matrix as a pure
//! function.

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{Actor, Role},
        work_order::{
            CreateWorkOrder, HistoryEntry, NewWorkOrder, UpdateStatus, WorkOrder,
            WorkOrderDetail, WorkOrderStatus, WorkOrderSummary,
        },
    },
    repository::Repository,
};

/// Hard cap on work-order listings
const LIST_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct WorkOrderService {
    repository: Repository,
}

impl WorkOrderService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a work order in status `open` with a generated number
    /// `WO-<YYYY-MM>-<seq>` where the sequence restarts every month.
    pub async fn create(&self, actor: &Actor, request: CreateWorkOrder) -> AppResult<WorkOrder> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self
            .repository
            .machines
            .get(request.machine_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "Machine {} not found",
                request.machine_id
            )));
        }
        if let Some(component_id) = request.component_id {
            if self.repository.components.get(component_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Component {} not found",
                    component_id
                )));
            }
        }

        let month = Utc::now().format("%Y-%m").to_string();
        let seq = self.repository.work_orders.next_sequence(&month).await?;
        let number = format!("WO-{}-{:04}", month, seq);

        let work_order = self
            .repository
            .work_orders
            .insert(NewWorkOrder {
                number: number.clone(),
                machine_id: request.machine_id,
                component_id: request.component_id,
                order_type: request.order_type,
                priority: request.priority,
                description: request.description,
                created_by: actor.username.clone(),
                history: vec![HistoryEntry::new(
                    WorkOrderStatus::Open,
                    &actor.username,
                    None,
                )],
            })
            .await?;

        tracing::info!(number = %number, by = %actor.username, "work order created");
        Ok(work_order)
    }

    /// Exclusively claim an open, unassigned work order. The winner becomes
    /// the assignee and the status moves to `in_progress`; everyone else is
    /// told who holds it.
    pub async fn claim(&self, actor: &Actor, id: i64) -> AppResult<WorkOrder> {
        let work_order = self.get_active(id).await?;

        if let Some(name) = work_order.assigned_name {
            return Err(AppError::AlreadyClaimed {
                assignee: name,
                claimed_at: work_order.assigned_at,
            });
        }
        if work_order.status != WorkOrderStatus::Open {
            return Err(AppError::InvalidState(
                "This work order can no longer be claimed".to_string(),
            ));
        }

        let entry = HistoryEntry::new(
            WorkOrderStatus::InProgress,
            &actor.username,
            Some("Claimed by technician".to_string()),
        );
        let claimed = self
            .repository
            .work_orders
            .try_claim(id, actor.id, &actor.username, entry)
            .await?;

        if !claimed {
            // Lost the race; report whoever won it.
            let current = self.get_active(id).await?;
            return Err(match current.assigned_name {
                Some(name) => AppError::AlreadyClaimed {
                    assignee: name,
                    claimed_at: current.assigned_at,
                },
                None => AppError::InvalidState(
                    "This work order can no longer be claimed".to_string(),
                ),
            });
        }

        tracing::info!(work_order = id, by = %actor.username, "work order claimed");
        self.get_active(id).await
    }

    /// Change the status of a work order. An unassigned work order is
    /// auto-claimed when a technician starts work on it.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: i64,
        request: UpdateStatus,
    ) -> AppResult<WorkOrder> {
        let target: WorkOrderStatus = request
            .status
            .parse()
            .map_err(|_| AppError::Validation("Invalid status".to_string()))?;
        if !WorkOrderStatus::SETTABLE.contains(&target) {
            return Err(AppError::Validation("Invalid status".to_string()));
        }

        let mut work_order = self.get_active(id).await?;
        let mut is_owner = work_order.is_owner(actor.id);

        if work_order.assigned_to.is_none()
            && actor.role == Role::Technician
            && target == WorkOrderStatus::InProgress
        {
            if self
                .repository
                .work_orders
                .try_assign(id, actor.id, &actor.username)
                .await?
            {
                is_owner = true;
            } else {
                // Someone else got assigned in between; re-evaluate against
                // the current assignment.
                work_order = self.get_active(id).await?;
                is_owner = work_order.is_owner(actor.id);
            }
        }

        authorize_status_change(actor, target, is_owner, work_order.assigned_name.as_deref())?;

        let note = request.note.filter(|n| !n.trim().is_empty());
        let entry = HistoryEntry::new(target, &actor.username, note);
        if !self
            .repository
            .work_orders
            .set_status(id, target, entry)
            .await?
        {
            return Err(AppError::NotFound(format!("Work order {} not found", id)));
        }

        tracing::info!(work_order = id, status = %target, by = %actor.username, "status changed");
        self.get_active(id).await
    }

    /// Move a completed or closed work order into the archive
    pub async fn archive(&self, id: i64) -> AppResult<()> {
        let work_order = self.get_active(id).await?;
        if !work_order.status.is_archivable() {
            return Err(AppError::InvalidState(
                "Only completed or closed work orders can be archived".to_string(),
            ));
        }
        self.repository.work_orders.archive(id).await?;
        tracing::info!(work_order = id, "work order archived");
        Ok(())
    }

    /// Bring an archived work order back into the active set
    pub async fn restore(&self, id: i64) -> AppResult<WorkOrder> {
        self.repository.work_orders.restore(id).await?;
        tracing::info!(work_order = id, "work order restored");
        self.get_active(id).await
    }

    /// Active work orders, newest first, optionally filtered by status
    pub async fn list(&self, status: Option<String>) -> AppResult<Vec<WorkOrderSummary>> {
        let status = match status {
            Some(s) => Some(
                s.parse::<WorkOrderStatus>()
                    .map_err(|_| AppError::Validation("Invalid status".to_string()))?,
            ),
            None => None,
        };
        let work_orders = self.repository.work_orders.list(status, LIST_LIMIT).await?;
        self.summarize(work_orders).await
    }

    pub async fn list_archive(&self) -> AppResult<Vec<WorkOrderSummary>> {
        let work_orders = self.repository.work_orders.list_archive().await?;
        self.summarize(work_orders).await
    }

    /// Single work order with plain machine and component names
    pub async fn get(&self, id: i64) -> AppResult<WorkOrderDetail> {
        let work_order = self.get_active(id).await?;

        let machine_name = match self.repository.machines.get(work_order.machine_id).await? {
            Some(machine) => machine.name,
            None => "-".to_string(),
        };
        let component_name = match work_order.component_id {
            Some(component_id) => self
                .repository
                .components
                .get(component_id)
                .await?
                .map(|c| c.name)
                .unwrap_or_else(|| "-".to_string()),
            None => "-".to_string(),
        };

        Ok(WorkOrderDetail {
            work_order,
            machine_name,
            component_name,
        })
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.repository.work_orders.delete(id).await? {
            return Err(AppError::NotFound(format!("Work order {} not found", id)));
        }
        tracing::info!(work_order = id, "work order deleted");
        Ok(())
    }

    async fn get_active(&self, id: i64) -> AppResult<WorkOrder> {
        self.repository
            .work_orders
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work order {} not found", id)))
    }

    async fn summarize(&self, work_orders: Vec<WorkOrder>) -> AppResult<Vec<WorkOrderSummary>> {
        let mut result = Vec::with_capacity(work_orders.len());
        for wo in work_orders {
            let machine_name = match self.repository.machines.get(wo.machine_id).await? {
                Some(machine) => machine.display_name(),
                None => "Unknown Machine".to_string(),
            };
            let component_name = match wo.component_id {
                Some(component_id) => self
                    .repository
                    .components
                    .get(component_id)
                    .await?
                    .map(|c| c.display_name())
                    .unwrap_or_else(|| "-".to_string()),
                None => "-".to_string(),
            };
            result.push(WorkOrderSummary {
                id: wo.id,
                number: wo.number,
                order_type: wo.order_type,
                priority: wo.priority,
                status: wo.status,
                description: wo.description,
                created_at: wo.created_at,
                machine_id: wo.machine_id,
                machine_name,
                component_name,
                assigned_name: wo.assigned_name,
                history: wo.history,
            });
        }
        Ok(result)
    }
}

/// Decide whether `actor` may move a work order to `target`.
///
/// Owners may move their work order through any settable status except
/// `closed`; supervisors and admins may move any work order anywhere,
/// including backwards. Closing is reserved to supervisors and admins.
fn authorize_status_change(
    actor: &Actor,
    target: WorkOrderStatus,
    is_owner: bool,
    assignee: Option<&str>,
) -> AppResult<()> {
    if !is_owner && !actor.is_supervisor_or_admin() {
        return Err(AppError::NotOwner {
            assignee: assignee.map(str::to_string),
        });
    }
    if target == WorkOrderStatus::Closed && !actor.is_supervisor_or_admin() {
        return Err(AppError::Forbidden(
            "Only a supervisor or admin can close a work order".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::machine::CreateMachine,
        services::machines::MachineService,
    };
    use regex::Regex;

    fn actor(id: i64, name: &str, role: Role) -> Actor {
        Actor {
            id,
            username: name.to_string(),
            role,
        }
    }

    async fn setup() -> (WorkOrderService, i64) {
        let repository = Repository::in_memory();
        let machine = MachineService::new(repository.clone())
            .create(CreateMachine {
                code: "PRS-01".to_string(),
                name: "Press Line 1".to_string(),
                machine_type: "hydraulic press".to_string(),
                location: "Hall A".to_string(),
                install_date: "2022-06-01".to_string(),
                status: None,
            })
            .await
            .unwrap();
        (WorkOrderService::new(repository), machine.id)
    }

    fn request(machine_id: i64) -> CreateWorkOrder {
        CreateWorkOrder {
            machine_id,
            component_id: None,
            order_type: "corrective".to_string(),
            priority: "high".to_string(),
            description: "Hydraulic pressure drops under load".to_string(),
        }
    }

    fn set_status(status: &str) -> UpdateStatus {
        UpdateStatus {
            status: status.to_string(),
            note: None,
        }
    }

    #[tokio::test]
    async fn numbering_is_monthly_and_sequential() {
        let (service, machine_id) = setup().await;
        let creator = actor(1, "sari", Role::Supervisor);

        let first = service.create(&creator, request(machine_id)).await.unwrap();
        let second = service.create(&creator, request(machine_id)).await.unwrap();

        let pattern = Regex::new(r"^WO-\d{4}-\d{2}-(\d{4})$").unwrap();
        let seq_of = |number: &str| {
            pattern.captures(number).unwrap()[1]
                .parse::<i64>()
                .unwrap()
        };
        assert!(pattern.is_match(&first.number), "{}", first.number);
        assert_eq!(seq_of(&second.number), seq_of(&first.number) + 1);
        assert_eq!(first.status, WorkOrderStatus::Open);
        assert_eq!(first.history.len(), 1);
        assert_eq!(first.history[0].status, WorkOrderStatus::Open);
    }

    #[tokio::test]
    async fn create_rejects_unknown_machine() {
        let (service, _) = setup().await;
        let err = service
            .create(&actor(1, "sari", Role::Supervisor), request(999))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn claim_assigns_and_moves_to_in_progress() {
        let (service, machine_id) = setup().await;
        let wo = service
            .create(&actor(1, "sari", Role::Supervisor), request(machine_id))
            .await
            .unwrap();

        let tech = actor(2, "budi", Role::Technician);
        let claimed = service.claim(&tech, wo.id).await.unwrap();

        assert_eq!(claimed.status, WorkOrderStatus::InProgress);
        assert_eq!(claimed.assigned_to, Some(2));
        assert_eq!(claimed.assigned_name.as_deref(), Some("budi"));
        assert!(claimed.assigned_at.is_some());
        assert_eq!(claimed.history.len(), 2);
        assert_eq!(
            claimed.history[1].note.as_deref(),
            Some("Claimed by technician")
        );
    }

    #[tokio::test]
    async fn claim_is_exclusive() {
        let (service, machine_id) = setup().await;
        let wo = service
            .create(&actor(1, "sari", Role::Supervisor), request(machine_id))
            .await
            .unwrap();

        service
            .claim(&actor(2, "budi", Role::Technician), wo.id)
            .await
            .unwrap();

        let err = service
            .claim(&actor(3, "dian", Role::Technician), wo.id)
            .await
            .unwrap_err();
        match err {
            AppError::AlreadyClaimed {
                assignee,
                claimed_at,
            } => {
                assert_eq!(assignee, "budi");
                assert!(claimed_at.is_some());
            }
            other => panic!("expected AlreadyClaimed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let (service, machine_id) = setup().await;
        let wo = service
            .create(&actor(1, "sari", Role::Supervisor), request(machine_id))
            .await
            .unwrap();

        let a = {
            let service = service.clone();
            let tech = actor(2, "budi", Role::Technician);
            tokio::spawn(async move { service.claim(&tech, wo.id).await })
        };
        let b = {
            let service = service.clone();
            let tech = actor(3, "dian", Role::Technician);
            tokio::spawn(async move { service.claim(&tech, wo.id).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);

        let current = service.get(wo.id).await.unwrap().work_order;
        assert_eq!(current.history.len(), 2);
    }

    #[tokio::test]
    async fn claim_requires_open_status() {
        let (service, machine_id) = setup().await;
        let supervisor = actor(1, "sari", Role::Supervisor);
        let wo = service
            .create(&supervisor, request(machine_id))
            .await
            .unwrap();
        service
            .update_status(&supervisor, wo.id, set_status("completed"))
            .await
            .unwrap();

        let err = service
            .claim(&actor(2, "budi", Role::Technician), wo.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn owner_may_progress_but_not_close() {
        let (service, machine_id) = setup().await;
        let wo = service
            .create(&actor(1, "sari", Role::Supervisor), request(machine_id))
            .await
            .unwrap();

        let tech = actor(2, "budi", Role::Technician);
        service.claim(&tech, wo.id).await.unwrap();

        let updated = service
            .update_status(&tech, wo.id, set_status("waiting_sparepart"))
            .await
            .unwrap();
        assert_eq!(updated.status, WorkOrderStatus::WaitingSparepart);

        service
            .update_status(&tech, wo.id, set_status("completed"))
            .await
            .unwrap();

        let err = service
            .update_status(&tech, wo.id, set_status("closed"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn non_owner_technician_is_rejected_with_assignee_info() {
        let (service, machine_id) = setup().await;
        let wo = service
            .create(&actor(1, "sari", Role::Supervisor), request(machine_id))
            .await
            .unwrap();
        service
            .claim(&actor(2, "budi", Role::Technician), wo.id)
            .await
            .unwrap();

        let err = service
            .update_status(
                &actor(3, "dian", Role::Technician),
                wo.id,
                set_status("completed"),
            )
            .await
            .unwrap_err();
        match err {
            AppError::NotOwner { assignee } => assert_eq!(assignee.as_deref(), Some("budi")),
            other => panic!("expected NotOwner, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn supervisor_overrides_ownership_and_closes() {
        let (service, machine_id) = setup().await;
        let wo = service
            .create(&actor(1, "sari", Role::Supervisor), request(machine_id))
            .await
            .unwrap();
        service
            .claim(&actor(2, "budi", Role::Technician), wo.id)
            .await
            .unwrap();

        let supervisor = actor(1, "sari", Role::Supervisor);
        service
            .update_status(&supervisor, wo.id, set_status("completed"))
            .await
            .unwrap();
        let closed = service
            .update_status(&supervisor, wo.id, set_status("closed"))
            .await
            .unwrap();
        assert_eq!(closed.status, WorkOrderStatus::Closed);
    }

    #[tokio::test]
    async fn technician_auto_claims_when_starting_work() {
        let (service, machine_id) = setup().await;
        let wo = service
            .create(&actor(1, "sari", Role::Supervisor), request(machine_id))
            .await
            .unwrap();

        let tech = actor(2, "budi", Role::Technician);
        let updated = service
            .update_status(&tech, wo.id, set_status("in_progress"))
            .await
            .unwrap();
        assert_eq!(updated.assigned_to, Some(2));
        assert_eq!(updated.assigned_name.as_deref(), Some("budi"));
        assert_eq!(updated.status, WorkOrderStatus::InProgress);
    }

    #[tokio::test]
    async fn backward_jump_is_a_matter_of_authorization_only() {
        let (service, machine_id) = setup().await;
        let wo = service
            .create(&actor(1, "sari", Role::Supervisor), request(machine_id))
            .await
            .unwrap();
        let tech = actor(2, "budi", Role::Technician);
        service.claim(&tech, wo.id).await.unwrap();
        service
            .update_status(&tech, wo.id, set_status("completed"))
            .await
            .unwrap();

        // Reopening completed work is allowed for the owner
        let reopened = service
            .update_status(&tech, wo.id, set_status("in_progress"))
            .await
            .unwrap();
        assert_eq!(reopened.status, WorkOrderStatus::InProgress);
    }

    #[tokio::test]
    async fn open_cannot_be_requested_as_target() {
        let (service, machine_id) = setup().await;
        let supervisor = actor(1, "sari", Role::Supervisor);
        let wo = service
            .create(&supervisor, request(machine_id))
            .await
            .unwrap();

        for status in ["open", "cancelled"] {
            let err = service
                .update_status(&supervisor, wo.id, set_status(status))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{}", status);
        }
    }

    #[tokio::test]
    async fn history_grows_append_only_and_chronologically() {
        let (service, machine_id) = setup().await;
        let supervisor = actor(1, "sari", Role::Supervisor);
        let wo = service
            .create(&supervisor, request(machine_id))
            .await
            .unwrap();
        let tech = actor(2, "budi", Role::Technician);
        service.claim(&tech, wo.id).await.unwrap();
        service
            .update_status(&tech, wo.id, set_status("waiting_sparepart"))
            .await
            .unwrap();
        let current = service
            .update_status(&tech, wo.id, set_status("completed"))
            .await
            .unwrap();

        assert_eq!(current.history.len(), 4);
        let statuses: Vec<_> = current.history.iter().map(|h| h.status).collect();
        assert_eq!(
            statuses,
            vec![
                WorkOrderStatus::Open,
                WorkOrderStatus::InProgress,
                WorkOrderStatus::WaitingSparepart,
                WorkOrderStatus::Completed,
            ]
        );
        assert!(current
            .history
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn archive_rejects_non_terminal_status() {
        let (service, machine_id) = setup().await;
        let wo = service
            .create(&actor(1, "sari", Role::Supervisor), request(machine_id))
            .await
            .unwrap();

        let err = service.archive(wo.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn archive_and_restore_round_trip_preserves_identity() {
        let (service, machine_id) = setup().await;
        let supervisor = actor(1, "sari", Role::Supervisor);
        let wo = service
            .create(&supervisor, request(machine_id))
            .await
            .unwrap();
        service
            .update_status(&supervisor, wo.id, set_status("completed"))
            .await
            .unwrap();
        let before = service.get(wo.id).await.unwrap().work_order;

        service.archive(wo.id).await.unwrap();
        assert!(matches!(
            service.get(wo.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert_eq!(service.list_archive().await.unwrap().len(), 1);

        let restored = service.restore(wo.id).await.unwrap();
        assert_eq!(restored, before);
        assert!(service.list_archive().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restore_of_unarchived_id_is_not_found() {
        let (service, _) = setup().await;
        let err = service.restore(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_labels_machines_and_components() {
        let (service, machine_id) = setup().await;
        let supervisor = actor(1, "sari", Role::Supervisor);
        service
            .create(&supervisor, request(machine_id))
            .await
            .unwrap();

        let summaries = service.list(None).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].machine_name, "PRS-01 - Press Line 1");
        assert_eq!(summaries[0].component_name, "-");

        let open = service.list(Some("open".to_string())).await.unwrap();
        assert_eq!(open.len(), 1);
        let closed = service.list(Some("closed".to_string())).await.unwrap();
        assert!(closed.is_empty());
        assert!(matches!(
            service.list(Some("bogus".to_string())).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn deleted_machine_shows_placeholder_label() {
        let repository = Repository::in_memory();
        let machines = MachineService::new(repository.clone());
        let machine = machines
            .create(CreateMachine {
                code: "TMP-01".to_string(),
                name: "Temporary".to_string(),
                machine_type: "test rig".to_string(),
                location: "Hall C".to_string(),
                install_date: "2023-01-01".to_string(),
                status: None,
            })
            .await
            .unwrap();
        let service = WorkOrderService::new(repository);
        service
            .create(&actor(1, "sari", Role::Supervisor), request(machine.id))
            .await
            .unwrap();
        machines.delete(machine.id).await.unwrap();

        let summaries = service.list(None).await.unwrap();
        assert_eq!(summaries[0].machine_name, "Unknown Machine");
    }

    #[test]
    fn permission_matrix() {
        let cases = [
            // (role, is_owner, target, allowed)
            (Role::Technician, true, WorkOrderStatus::InProgress, true),
            (Role::Technician, true, WorkOrderStatus::Completed, true),
            (Role::Technician, true, WorkOrderStatus::Closed, false),
            (Role::Technician, false, WorkOrderStatus::Completed, false),
            (Role::Operator, false, WorkOrderStatus::InProgress, false),
            (Role::Supervisor, false, WorkOrderStatus::Completed, true),
            (Role::Supervisor, false, WorkOrderStatus::Closed, true),
            (Role::Admin, false, WorkOrderStatus::Closed, true),
        ];
        for (role, is_owner, target, allowed) in cases {
            let result = authorize_status_change(
                &actor(9, "case", role),
                target,
                is_owner,
                Some("budi"),
            );
            assert_eq!(
                result.is_ok(),
                allowed,
                "{:?} owner={} target={}",
                role,
                is_owner,
                target
            );
        }
    }
}
