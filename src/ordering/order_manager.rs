//! Order Manager
//!
//! Renumbers siblings so every container's children carry the orders
//! `0..n` after each create, delete and move. Works for any [`Positioned`]
//! entity through its [`PositionedRepository`].

use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;

use super::policy::InsertPosition;
use crate::domain::{Container, ContainerRef, DomainError, DomainResult, Positioned};
use crate::repository::PositionedRepository;

pub struct OrderManager<T: Positioned> {
    repo: Arc<dyn PositionedRepository<T>>,
    insert_position: InsertPosition,
}

impl<T: Positioned> Clone for OrderManager<T> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            insert_position: self.insert_position,
        }
    }
}

/// Validate a requested order against a container holding `len` other items
fn bounded_order(order: i32, len: usize) -> DomainResult<i32> {
    if order < 0 {
        return Err(DomainError::InvalidInput(format!("order must not be negative, got {}", order)));
    }
    Ok(order.min(len as i32))
}

impl<T: Positioned> OrderManager<T> {
    pub fn new(repo: Arc<dyn PositionedRepository<T>>, insert_position: InsertPosition) -> Self {
        Self { repo, insert_position }
    }

    pub fn insert_position(&self) -> InsertPosition {
        self.insert_position
    }

    pub async fn get(&self, id: u32) -> DomainResult<T> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(T::NAME, id))
    }

    /// Children of a container sorted by order
    pub async fn children(&self, container: ContainerRef) -> DomainResult<Vec<T>> {
        self.repo.children_of(container).await
    }

    /// Children of a container other than `id`
    async fn siblings(&self, container: ContainerRef, id: u32) -> DomainResult<Vec<T>> {
        let mut children = self.repo.children_of(container).await?;
        children.retain(|child| child.id() != id);
        Ok(children)
    }

    /// Move every item with `order >= threshold` by `delta`
    async fn shift_from(&self, items: &[T], threshold: i32, delta: i32) -> DomainResult<()> {
        for item in items.iter().filter(|item| item.order() >= threshold) {
            let order = item.order() + delta;
            debug!("{} {}: order {} -> {}", T::NAME, item.id(), item.order(), order);
            self.repo.set_order(item.id(), order).await?;
        }
        Ok(())
    }

    /// Reject a destination that is `id` itself or lies anywhere in its
    /// subtree. Walks the parent chain upwards from `target`.
    async fn ensure_not_nested(&self, id: u32, target: ContainerRef) -> DomainResult<()> {
        let mut seen = HashSet::new();
        let mut cursor = target;
        while let ContainerRef::Task(parent_id) = cursor {
            if parent_id == id {
                return Err(DomainError::InvalidContainer(format!(
                    "{} {} cannot be placed under itself or its own subtasks",
                    T::NAME,
                    id
                )));
            }
            if !seen.insert(parent_id) {
                return Err(DomainError::Internal(format!("task {} is part of a parent cycle", parent_id)));
            }
            cursor = self.get(parent_id).await?.container();
        }
        Ok(())
    }

    /// Insert `item` into `container`.
    ///
    /// `None` places it according to the insert policy. `Some(k)` places it
    /// at `k` exactly (clamped to the child count); negative orders are
    /// rejected. Siblings at or after the new order move down by one.
    pub async fn create(
        &self,
        container: &Container,
        item: &T,
        requested_order: Option<i32>,
    ) -> DomainResult<T> {
        let destination = container.reference();
        let mut item = item.clone();
        item.place_in(destination)?;

        let siblings = self.repo.children_of(destination).await?;
        let order = match requested_order {
            Some(order) => bounded_order(order, siblings.len())?,
            None => self.insert_position.order_for(siblings.len()),
        };

        self.shift_from(&siblings, order, 1).await?;
        item.set_order(order);
        let created = self.repo.create(&item).await?;

        info!("created {} {} in {} at {}", T::NAME, created.id(), destination, order);
        Ok(created)
    }

    /// Remove an item and close the gap it leaves
    pub async fn delete(&self, item: &T) -> DomainResult<()> {
        let item = self.get(item.id()).await?;
        let container = item.container();

        let siblings = self.siblings(container, item.id()).await?;
        self.shift_from(&siblings, item.order() + 1, -1).await?;
        self.repo.delete(item.id()).await?;

        info!("deleted {} {} from {}", T::NAME, item.id(), container);
        Ok(())
    }

    /// Move an item to `order` inside `destination`, which may be its
    /// current container.
    ///
    /// The source gap is closed before the destination gap is opened, and
    /// the item itself is left out of both shifts, so a move inside one
    /// container never counts the item twice.
    pub async fn reorder(&self, item: &T, destination: &Container, order: i32) -> DomainResult<T> {
        let current = self.get(item.id()).await?;
        let source = current.container();
        let target = destination.reference();

        let mut moved = current.clone();
        moved.place_in(target)?;
        self.ensure_not_nested(current.id(), target).await?;
        if order < 0 {
            return Err(DomainError::InvalidInput(format!("order must not be negative, got {}", order)));
        }

        let source_siblings = self.siblings(source, current.id()).await?;
        self.shift_from(&source_siblings, current.order() + 1, -1).await?;

        let destination_children = self.siblings(target, current.id()).await?;
        let order = bounded_order(order, destination_children.len())?;
        self.shift_from(&destination_children, order, 1).await?;

        moved.set_order(order);
        let updated = self.repo.update(&moved).await?;

        info!(
            "moved {} {} from {} at {} to {} at {}",
            T::NAME,
            current.id(),
            source,
            current.order(),
            target,
            order
        );
        Ok(updated)
    }

    /// Renumber a container's children to `0..n`, keeping their relative
    /// order. Returns how many items changed.
    pub async fn reindex(&self, container: ContainerRef) -> DomainResult<usize> {
        let children = self.repo.children_of(container).await?;

        let mut changed = 0;
        for (index, child) in children.iter().enumerate() {
            let order = index as i32;
            if child.order() != order {
                self.repo.set_order(child.id(), order).await?;
                changed += 1;
            }
        }
        if changed > 0 {
            info!("reindexed {} {} items in {}", changed, T::NAME, container);
        }
        Ok(changed)
    }

    /// Whether the children of `container` carry exactly the orders `0..n`
    pub async fn is_dense(&self, container: ContainerRef) -> DomainResult<bool> {
        let children = self.repo.children_of(container).await?;
        Ok(children
            .iter()
            .enumerate()
            .all(|(index, child)| child.order() == index as i32))
    }
}
