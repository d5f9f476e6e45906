//! Component management service

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::component::{Component, CreateComponent, NewComponent, UpdateComponent},
    repository::Repository,
};

#[derive(Clone)]
pub struct ComponentService {
    repository: Repository,
}

impl ComponentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Component>> {
        self.repository.components.list().await
    }

    /// Components of one machine, sorted by name
    pub async fn list_by_machine(&self, machine_id: i64) -> AppResult<Vec<Component>> {
        self.repository.components.list_by_machine(machine_id).await
    }

    pub async fn get(&self, id: i64) -> AppResult<Component> {
        self.repository
            .components
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Component {} not found", id)))
    }

    /// Create a component under a machine. Defaults: install date now,
    /// status `good`, lifetimes zero.
    pub async fn create(
        &self,
        machine_id: i64,
        request: CreateComponent,
    ) -> AppResult<Component> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.repository.machines.get(machine_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Machine {} not found",
                machine_id
            )));
        }

        let component = NewComponent {
            machine_id,
            code: request.code.trim().to_uppercase(),
            name: request.name.trim().to_string(),
            install_date: request
                .install_date
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
            status: request.status.unwrap_or_else(|| "good".to_string()),
            lifetime_hours: request.lifetime_hours.unwrap_or(0),
            lifetime_cycles: request.lifetime_cycles.unwrap_or(0),
            notes: request.notes.map(|n| n.trim().to_string()).unwrap_or_default(),
        };

        let component = self.repository.components.insert(component).await?;
        tracing::info!(code = %component.code, machine_id, "component created");
        Ok(component)
    }

    /// Partial update; absent fields are left untouched
    pub async fn update(&self, id: i64, request: UpdateComponent) -> AppResult<Component> {
        let mut component = self.get(id).await?;
        let mut changed = false;

        if let Some(code) = request.code {
            component.code = code.trim().to_uppercase();
            changed = true;
        }
        if let Some(name) = request.name {
            component.name = name.trim().to_string();
            changed = true;
        }
        if let Some(install_date) = request.install_date.filter(|d| !d.trim().is_empty()) {
            component.install_date = install_date;
            changed = true;
        }
        if let Some(status) = request.status {
            component.status = status;
            changed = true;
        }
        if let Some(lifetime_hours) = request.lifetime_hours {
            component.lifetime_hours = lifetime_hours;
            changed = true;
        }
        if let Some(lifetime_cycles) = request.lifetime_cycles {
            component.lifetime_cycles = lifetime_cycles;
            changed = true;
        }
        if let Some(notes) = request.notes {
            component.notes = notes.trim().to_string();
            changed = true;
        }

        if !changed {
            return Err(AppError::NoChange("No fields to update".to_string()));
        }

        if !self.repository.components.update(&component).await? {
            return Err(AppError::NotFound(format!("Component {} not found", id)));
        }
        Ok(component)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.repository.components.delete(id).await? {
            return Err(AppError::NotFound(format!("Component {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::machine::{CreateMachine, Machine};
    use crate::services::machines::MachineService;

    async fn machine(repository: &Repository) -> Machine {
        MachineService::new(repository.clone())
            .create(CreateMachine {
                code: "CNV-01".to_string(),
                name: "Conveyor".to_string(),
                machine_type: "conveyor".to_string(),
                location: "Hall B".to_string(),
                install_date: "2021-03-15".to_string(),
                status: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let repository = Repository::in_memory();
        let machine = machine(&repository).await;
        let service = ComponentService::new(repository);

        let component = service
            .create(
                machine.id,
                CreateComponent {
                    code: "brg-01".to_string(),
                    name: "Drive bearing".to_string(),
                    install_date: None,
                    status: None,
                    lifetime_hours: None,
                    lifetime_cycles: None,
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(component.code, "BRG-01");
        assert_eq!(component.status, "good");
        assert_eq!(component.lifetime_hours, 0);
        assert!(!component.install_date.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_unknown_machine() {
        let service = ComponentService::new(Repository::in_memory());
        let err = service
            .create(
                999,
                CreateComponent {
                    code: "BRG-01".to_string(),
                    name: "Drive bearing".to_string(),
                    install_date: None,
                    status: None,
                    lifetime_hours: None,
                    lifetime_cycles: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn machine_delete_cascades_to_components() {
        let repository = Repository::in_memory();
        let machine = machine(&repository).await;
        let components = ComponentService::new(repository.clone());
        for code in ["BRG-01", "BLT-02"] {
            components
                .create(
                    machine.id,
                    CreateComponent {
                        code: code.to_string(),
                        name: format!("{} part", code),
                        install_date: None,
                        status: None,
                        lifetime_hours: None,
                        lifetime_cycles: None,
                        notes: None,
                    },
                )
                .await
                .unwrap();
        }

        let removed = MachineService::new(repository.clone())
            .delete(machine.id)
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(components.list().await.unwrap().is_empty());
    }
}
