// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use berth_core::QueuedRequest;

fn assignment(project_id: &str) -> SlotAssignment {
    let request = QueuedRequest::builder().project_id(project_id).build();
    SlotAssignment::for_request(&request, "amqp://broker")
}

#[tokio::test]
async fn slot_pool_dispatches_to_slot_calls() {
    let fake = FakeProvisioner::new();
    let provisioner = Provisioner::SlotPool(Arc::new(fake.clone()));
    assert_eq!(provisioner.kind(), "slot-pool");

    provisioner.prepare(3).await.unwrap();
    provisioner.assign(SlotId(2), &assignment("proj-a")).await.unwrap();
    provisioner.release(SlotId(2), "proj-a").await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            ProvisionCall::EnsureSlots(3),
            ProvisionCall::Assign { slot_id: SlotId(2), assignment: assignment("proj-a") },
            ProvisionCall::Release { slot_id: SlotId(2) },
        ]
    );
}

#[tokio::test]
async fn per_project_dispatches_to_container_calls() {
    let fake = FakeProvisioner::new();
    let provisioner = Provisioner::PerProject(Arc::new(fake.clone()));
    assert_eq!(provisioner.kind(), "per-project");

    provisioner.prepare(3).await.unwrap();
    provisioner.assign(SlotId(1), &assignment("proj-a")).await.unwrap();
    provisioner.release(SlotId(1), "proj-a").await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            ProvisionCall::Provision {
                project_id: "proj-a".into(),
                git_repo_url: "https://github.com/acme/app.git".into(),
            },
            ProvisionCall::Deprovision { project_id: "proj-a".into() },
        ]
    );
}

#[tokio::test]
async fn injected_failures_surface_as_errors() {
    let fake = FakeProvisioner::new();
    let provisioner = Provisioner::SlotPool(Arc::new(fake.clone()));
    fake.fail_project("proj-bad");
    fake.fail_releases(true);

    assert!(provisioner.assign(SlotId(1), &assignment("proj-ok")).await.is_ok());
    assert!(matches!(
        provisioner.assign(SlotId(1), &assignment("proj-bad")).await,
        Err(ProvisionError::Timeout { .. })
    ));
    assert!(provisioner.release(SlotId(1), "proj-ok").await.is_err());
    assert_eq!(fake.assigned_projects(), vec!["proj-ok", "proj-bad"]);
    assert_eq!(fake.released_slots(), vec![SlotId(1)]);
}
