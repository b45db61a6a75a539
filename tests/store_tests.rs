// Copyright (c) 2025 - Cowboy AI, Inc.
//! Persistence Integration Tests
//!
//! Template trees through the repository: atomic commits, ownership,
//! cascade delete, network rules on nested inserts and file-backed snapshots.

mod fixtures;

use std::sync::Arc;

use anyhow::Result;
use pretty_assertions::assert_eq;

use cim_range::errors::RangeError;
use cim_range::service::TemplateRepository;
use cim_range::store::{InMemoryTemplateStore, TemplateStore};
use cim_range::template::{
    EntityId, HostTemplate, RangeTemplate, SubnetTemplate, TemplateValidator, VpcTemplate,
};
use cim_range::domain::{CapacityPolicy, InstanceSpec, OperatingSystem, ValidationError};
use cim_range::errors::EntityKind;
use fixtures::*;

fn repository() -> TemplateRepository<InMemoryTemplateStore> {
    TemplateRepository::new(Arc::new(InMemoryTemplateStore::new()))
}

fn subnet(name: &str, cidr: &str) -> SubnetTemplate {
    let host = HostTemplate::new("extra", OperatingSystem::Suse15, InstanceSpec::Small, 10, vec![])
        .unwrap();
    SubnetTemplate::new(name, cidr.parse().unwrap(), vec![host]).unwrap()
}

#[tokio::test]
async fn test_range_round_trip() -> Result<()> {
    let repo = repository();
    let draft = training_range_draft("aws");
    let template = validate(&draft);

    let id = repo.create_standalone(&template, owner_1()).await?;
    let record = repo.get(id, Some(owner_1())).await?;

    assert_eq!(record.to_draft(), draft);
    assert_eq!(record.header.owner_id, owner_1());
    assert!(record.vpcs.iter().all(|vpc| vpc.header.range_id == Some(id)));
    assert_eq!(record.host_count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_cascade_delete_removes_every_descendant() -> Result<()> {
    let repo = repository();
    let keep = repo
        .create_standalone(&validate(&minimal_range_draft()), owner_2())
        .await?;
    let id = repo
        .create_standalone(&validate(&training_range_draft("azure")), owner_1())
        .await?;

    // 1 range + 2 VPCs + 3 subnets + 4 hosts
    assert_eq!(repo.delete_by_id(id, Some(owner_1())).await?, 10);

    assert!(matches!(
        repo.get(id, None).await,
        Err(RangeError::NotFound { kind: EntityKind::Range, .. })
    ));
    assert_eq!(repo.list_headers::<VpcTemplate>(Some(owner_1()), false).await?.len(), 0);
    assert_eq!(repo.list_headers::<HostTemplate>(Some(owner_1()), false).await?.len(), 0);

    // the other owner's tree is untouched
    assert_eq!(repo.get(keep, Some(owner_2())).await?.host_count(), 1);
    assert_eq!(repo.store().row_count().await, 4);
    Ok(())
}

#[tokio::test]
async fn test_nested_rows_cannot_be_deleted_directly() -> Result<()> {
    let repo = repository();
    repo.create_standalone(&validate(&minimal_range_draft()), owner_1())
        .await?;
    let before = repo.store().row_count().await;

    let hosts = repo.list_headers::<HostTemplate>(None, false).await?;
    assert_eq!(hosts.len(), 1);
    assert!(!repo.delete::<HostTemplate>(&hosts[0]).await?);
    assert!(matches!(
        repo.delete_by_id(hosts[0].id, None).await,
        Err(RangeError::Conflict(_))
    ));

    assert_eq!(repo.store().row_count().await, before);
    Ok(())
}

#[tokio::test]
async fn test_standalone_listing() -> Result<()> {
    let repo = repository();
    repo.create_standalone(&validate(&minimal_range_draft()), owner_1())
        .await?;
    repo.create_standalone(&subnet("loose", "10.9.1.0/24"), owner_1())
        .await?;

    let all = repo.list_headers::<SubnetTemplate>(Some(owner_1()), false).await?;
    let standalone = repo.list_headers::<SubnetTemplate>(Some(owner_1()), true).await?;
    assert_eq!(all.len(), 2);
    assert_eq!(standalone.len(), 1);
    assert_eq!(standalone[0].name, "loose");
    assert!(repo
        .list_headers::<SubnetTemplate>(Some(owner_2()), false)
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_commit_leaves_storage_unchanged() -> Result<()> {
    let repo = repository();
    let range_id = repo
        .create_standalone(&validate(&minimal_range_draft()), owner_1())
        .await?;
    let vpc_id = repo.get(range_id, None).await?.vpcs[0].header.id;
    let before = repo.store().snapshot().await;

    // duplicate sibling name: "users" already exists under the VPC
    let mut tx = repo.begin();
    repo.create_nested(&mut tx, &subnet("servers", "10.0.3.0/24"), owner_1(), vpc_id);
    repo.create_nested(&mut tx, &subnet("users", "10.0.4.0/24"), owner_1(), vpc_id);
    assert!(matches!(repo.commit(tx).await, Err(RangeError::Conflict(_))));

    // owner mismatch
    let mut tx = repo.begin();
    repo.create_nested(&mut tx, &subnet("guests", "10.0.5.0/24"), owner_2(), vpc_id);
    assert!(matches!(repo.commit(tx).await, Err(RangeError::Conflict(_))));

    // missing parent
    let mut tx = repo.begin();
    repo.create_nested(
        &mut tx,
        &subnet("ghost", "10.0.6.0/24"),
        owner_1(),
        EntityId::<VpcTemplate>::new(),
    );
    assert!(matches!(repo.commit(tx).await, Err(RangeError::Conflict(_))));

    assert_eq!(repo.store().snapshot().await, before);
    Ok(())
}

fn host(hostname: &str) -> HostTemplate {
    HostTemplate::new(hostname, OperatingSystem::Debian12, InstanceSpec::Tiny, 8, vec![]).unwrap()
}

/// Stored minimal range and the id of its `corp` VPC
async fn stored_vpc(
    repo: &TemplateRepository<InMemoryTemplateStore>,
) -> Result<EntityId<VpcTemplate>> {
    let range_id = repo
        .create_standalone(&validate(&minimal_range_draft()), owner_1())
        .await?;
    Ok(repo.get(range_id, None).await?.vpcs[0].header.id)
}

#[tokio::test]
async fn test_nested_subnet_outside_vpc_is_rejected() -> Result<()> {
    let repo = repository();
    let vpc_id = stored_vpc(&repo).await?;
    let before = repo.store().snapshot().await;

    let mut tx = repo.begin();
    repo.create_nested(&mut tx, &subnet("guests", "172.16.1.0/24"), owner_1(), vpc_id);

    let err = repo.commit(tx).await.unwrap_err();
    assert!(matches!(
        err,
        RangeError::Validation(ValidationError::SubnetNotContained { .. })
    ));
    assert_eq!(repo.store().snapshot().await, before);
    Ok(())
}

#[tokio::test]
async fn test_nested_subnet_on_public_block_is_rejected() -> Result<()> {
    let repo = repository();
    let vpc_id = stored_vpc(&repo).await?;
    let before = repo.store().snapshot().await;

    // 10.0.99.0/24 is reserved for the derived public subnet of 10.0.0.0/16
    let mut tx = repo.begin();
    repo.create_nested(&mut tx, &subnet("guests", "10.0.99.0/25"), owner_1(), vpc_id);

    let err = repo.commit(tx).await.unwrap_err();
    assert!(matches!(
        err,
        RangeError::Validation(ValidationError::PublicSubnetOverlap { .. })
    ));
    assert_eq!(repo.store().snapshot().await, before);
    Ok(())
}

#[tokio::test]
async fn test_nested_subnets_checked_together_with_batch() -> Result<()> {
    let repo = repository();
    let vpc_id = stored_vpc(&repo).await?;
    let before = repo.store().snapshot().await;

    // the first subnet is fine on its own; the second is outside the VPC
    let mut tx = repo.begin();
    repo.create_nested(&mut tx, &subnet("servers", "10.0.2.0/24"), owner_1(), vpc_id);
    repo.create_nested(&mut tx, &subnet("guests", "10.1.0.0/24"), owner_1(), vpc_id);
    assert!(matches!(repo.commit(tx).await, Err(RangeError::Validation(_))));
    assert_eq!(repo.store().snapshot().await, before);

    let mut tx = repo.begin();
    repo.create_nested(&mut tx, &subnet("servers", "10.0.2.0/24"), owner_1(), vpc_id);
    assert_eq!(repo.commit(tx).await?.rows, 2);
    Ok(())
}

#[tokio::test]
async fn test_nested_hosts_past_capacity_are_rejected() -> Result<()> {
    let repo = repository();
    // /28 holds 16 - 5 = 11 hosts; one is already stored
    let subnet_id = repo
        .create_standalone(&subnet("tight", "10.5.0.0/28"), owner_1())
        .await?;
    let before = repo.store().snapshot().await;

    let mut tx = repo.begin();
    for i in 0..11 {
        repo.create_nested(&mut tx, &host(&format!("h-{i:02}")), owner_1(), subnet_id);
    }
    let err = repo.commit(tx).await.unwrap_err();
    assert!(matches!(
        err,
        RangeError::Validation(ValidationError::CapacityExceeded {
            capacity: 11,
            requested: 12,
            ..
        })
    ));
    assert_eq!(repo.store().snapshot().await, before);

    let mut tx = repo.begin();
    for i in 0..10 {
        repo.create_nested(&mut tx, &host(&format!("h-{i:02}")), owner_1(), subnet_id);
    }
    assert_eq!(repo.commit(tx).await?.rows, 10);

    let mut tx = repo.begin();
    repo.create_nested(&mut tx, &host("one-more"), owner_1(), subnet_id);
    assert!(matches!(repo.commit(tx).await, Err(RangeError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn test_store_capacity_policy_is_configurable() -> Result<()> {
    let store = InMemoryTemplateStore::new().with_capacity_policy(CapacityPolicy::CLASSIC);
    let repo = TemplateRepository::new(Arc::new(store));
    // /29 has no capacity under the AWS rules, 6 hosts under the classic ones
    let tight = SubnetTemplate::with_policy(
        "tight",
        "10.5.0.0/29".parse()?,
        vec![host("seed")],
        &CapacityPolicy::CLASSIC,
    )?;
    let subnet_id = repo.create_standalone(&tight, owner_1()).await?;

    let mut tx = repo.begin();
    for i in 0..5 {
        repo.create_nested(&mut tx, &host(&format!("h-{i}")), owner_1(), subnet_id);
    }
    assert_eq!(repo.commit(tx).await?.rows, 5);

    let mut tx = repo.begin();
    repo.create_nested(&mut tx, &host("h-5"), owner_1(), subnet_id);
    assert!(matches!(repo.commit(tx).await, Err(RangeError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn test_snapshot_survives_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("store.json");
    let draft = training_range_draft("aws");

    let id = {
        let store = InMemoryTemplateStore::open(&path).await?;
        let repo = TemplateRepository::new(Arc::new(store));
        repo.create_standalone(&TemplateValidator::default().range(&draft)?, owner_1())
            .await?
    };

    let reopened = TemplateRepository::new(Arc::new(InMemoryTemplateStore::open(&path).await?));
    assert_eq!(reopened.get(id, Some(owner_1())).await?.to_draft(), draft);

    assert_eq!(reopened.delete_by_id(id, None).await?, 10);
    let again = InMemoryTemplateStore::open(&path).await?;
    assert_eq!(again.row_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_owner_checks() -> Result<()> {
    let repo = repository();
    let id = repo
        .create_standalone(&validate(&minimal_range_draft()), owner_1())
        .await?;

    assert!(repo.is_owner(id, owner_1()).await?);
    assert!(!repo.is_owner(id, owner_2()).await?);
    assert!(!repo.is_owner(EntityId::<RangeTemplate>::new(), owner_1()).await?);
    assert_eq!(
        repo.store().owner_of(EntityKind::Range, id.as_uuid()).await?,
        Some(owner_1())
    );
    Ok(())
}
