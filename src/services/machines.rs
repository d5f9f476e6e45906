//! Machine management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::machine::{CreateMachine, Machine, NewMachine, UpdateMachine},
    repository::Repository,
};

#[derive(Clone)]
pub struct MachineService {
    repository: Repository,
}

impl MachineService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all machines, newest first
    pub async fn list(&self) -> AppResult<Vec<Machine>> {
        self.repository.machines.list().await
    }

    pub async fn get(&self, id: i64) -> AppResult<Machine> {
        self.repository
            .machines
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Machine {} not found", id)))
    }

    /// Create a machine. The code is normalized to uppercase and the status
    /// defaults to `active`.
    pub async fn create(&self, request: CreateMachine) -> AppResult<Machine> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let machine = NewMachine {
            code: request.code.trim().to_uppercase(),
            name: request.name.trim().to_string(),
            machine_type: request.machine_type.trim().to_string(),
            location: request.location.trim().to_string(),
            install_date: request.install_date,
            status: request.status.unwrap_or_else(|| "active".to_string()),
        };

        let machine = self.repository.machines.insert(machine).await?;
        tracing::info!(code = %machine.code, "machine created");
        Ok(machine)
    }

    /// Partial update; absent or blank fields are left untouched
    pub async fn update(&self, id: i64, request: UpdateMachine) -> AppResult<Machine> {
        let mut machine = self.get(id).await?;
        let mut changed = false;

        if let Some(code) = non_blank(request.code) {
            machine.code = code.to_uppercase();
            changed = true;
        }
        if let Some(name) = non_blank(request.name) {
            machine.name = name;
            changed = true;
        }
        if let Some(machine_type) = non_blank(request.machine_type) {
            machine.machine_type = machine_type;
            changed = true;
        }
        if let Some(location) = non_blank(request.location) {
            machine.location = location;
            changed = true;
        }
        if let Some(install_date) = non_blank(request.install_date) {
            machine.install_date = install_date;
            changed = true;
        }
        if let Some(status) = non_blank(request.status) {
            machine.status = status;
            changed = true;
        }

        if !changed {
            return Err(AppError::NoChange("No fields to update".to_string()));
        }

        if !self.repository.machines.update(&machine).await? {
            return Err(AppError::NotFound(format!("Machine {} not found", id)));
        }
        Ok(machine)
    }

    /// Delete a machine together with its components; returns the number of
    /// components removed.
    pub async fn delete(&self, id: i64) -> AppResult<u64> {
        if self.repository.machines.get(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Machine {} not found", id)));
        }

        let removed = self.repository.components.delete_by_machine(id).await?;
        self.repository.machines.delete(id).await?;
        tracing::info!(machine_id = id, components_removed = removed, "machine deleted");
        Ok(removed)
    }
}

fn non_blank(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(code: &str) -> CreateMachine {
        CreateMachine {
            code: code.to_string(),
            name: "Press Line 1".to_string(),
            machine_type: "hydraulic press".to_string(),
            location: "Hall A".to_string(),
            install_date: "2022-06-01".to_string(),
            status: None,
        }
    }

    #[tokio::test]
    async fn create_uppercases_code_and_defaults_status() {
        let service = MachineService::new(Repository::in_memory());
        let machine = service.create(request("prs-01")).await.unwrap();
        assert_eq!(machine.code, "PRS-01");
        assert_eq!(machine.status, "active");
    }

    #[tokio::test]
    async fn update_skips_blank_fields() {
        let service = MachineService::new(Repository::in_memory());
        let machine = service.create(request("PRS-01")).await.unwrap();

        let updated = service
            .update(
                machine.id,
                UpdateMachine {
                    name: Some("Press Line 2".to_string()),
                    location: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Press Line 2");
        assert_eq!(updated.location, "Hall A");

        let err = service
            .update(machine.id, UpdateMachine::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoChange(_)));
    }
}
