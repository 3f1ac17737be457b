use tracing::info;
use uuid::Uuid;

use crate::core::errors::{BillingError, BillingResult};
use crate::domain::{Category, CategoryKind, Ledger, UserId};

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    /// Required for root categories; children inherit the parent's kind.
    pub kind: Option<CategoryKind>,
    pub parent_id: Option<Uuid>,
}

pub struct CategoryService;

impl CategoryService {
    /// Creates a category owned by `owner`.
    pub fn create(ledger: &mut Ledger, owner: UserId, new: NewCategory) -> BillingResult<Category> {
        Self::insert(ledger, Some(owner), new)
    }

    /// Creates a category visible to every owner.
    pub fn create_global(ledger: &mut Ledger, new: NewCategory) -> BillingResult<Category> {
        Self::insert(ledger, None, new)
    }

    fn insert(
        ledger: &mut Ledger,
        owner: Option<UserId>,
        new: NewCategory,
    ) -> BillingResult<Category> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(BillingError::InvalidInput("category name is required".into()));
        }

        let kind = match new.parent_id {
            Some(parent_id) => {
                let parent = ledger
                    .category(parent_id)
                    .filter(|parent| match owner {
                        Some(owner) => parent.is_visible_to(owner),
                        None => parent.is_global(),
                    })
                    .ok_or_else(|| {
                        BillingError::InvalidInput(format!("unknown parent category {parent_id}"))
                    })?;
                if parent.parent_id.is_some() {
                    return Err(BillingError::InvalidInput(
                        "categories support at most two levels".into(),
                    ));
                }
                if !parent.is_active {
                    return Err(BillingError::InvalidInput(format!(
                        "parent category {parent_id} is inactive"
                    )));
                }
                parent.kind
            }
            None => new.kind.ok_or_else(|| {
                BillingError::InvalidInput("root categories need a kind".into())
            })?,
        };

        let needle = name.to_lowercase();
        let duplicate = ledger.categories.iter().any(|category| {
            category.owner_id == owner
                && category.parent_id == new.parent_id
                && category.name.to_lowercase() == needle
        });
        if duplicate {
            return Err(BillingError::InvalidInput(format!(
                "category `{name}` already exists at this level"
            )));
        }

        let mut category = Category::new(owner, name, kind);
        category.parent_id = new.parent_id;
        ledger.categories.push(category.clone());
        info!(category = %category.id, kind = %kind, global = owner.is_none(), "category created");
        Ok(category)
    }

    /// Global and owned categories, parents before their children.
    pub fn list(ledger: &Ledger, owner: UserId, include_inactive: bool) -> Vec<&Category> {
        let visible = |category: &&Category| {
            category.is_visible_to(owner) && (include_inactive || category.is_active)
        };
        let mut ordered = Vec::new();
        for root in ledger
            .categories
            .iter()
            .filter(visible)
            .filter(|category| category.parent_id.is_none())
        {
            ordered.push(root);
            ordered.extend(
                ledger
                    .categories
                    .iter()
                    .filter(visible)
                    .filter(|child| child.parent_id == Some(root.id)),
            );
        }
        ordered
    }

    pub fn rename(
        ledger: &mut Ledger,
        owner: UserId,
        id: Uuid,
        name: &str,
    ) -> BillingResult<Category> {
        let current = Self::owned(ledger, owner, id)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(BillingError::InvalidInput("category name is required".into()));
        }
        let parent_id = current.parent_id;
        let needle = name.to_lowercase();
        if ledger.categories.iter().any(|category| {
            category.id != id
                && category.owner_id == Some(owner)
                && category.parent_id == parent_id
                && category.name.to_lowercase() == needle
        }) {
            return Err(BillingError::InvalidInput(format!(
                "category `{name}` already exists at this level"
            )));
        }

        let category = ledger
            .category_mut(id)
            .ok_or_else(|| BillingError::NotFound(format!("category {id} not found")))?;
        category.name = name.to_string();
        info!(category = %id, "category renamed");
        Ok(category.clone())
    }

    /// Activates or deactivates an owned category together with its children.
    pub fn set_active(
        ledger: &mut Ledger,
        owner: UserId,
        id: Uuid,
        is_active: bool,
    ) -> BillingResult<Category> {
        Self::owned(ledger, owner, id)?;
        for category in ledger
            .categories
            .iter_mut()
            .filter(|category| category.id == id || category.parent_id == Some(id))
        {
            category.is_active = is_active;
        }
        info!(category = %id, is_active, "category activity changed");
        ledger
            .category(id)
            .cloned()
            .ok_or_else(|| BillingError::NotFound(format!("category {id} not found")))
    }

    /// Case-insensitive lookup among the categories visible to `owner`,
    /// preferring the owner's own rows over global ones.
    pub fn find_by_name<'a>(ledger: &'a Ledger, owner: UserId, name: &str) -> Option<&'a Category> {
        let needle = name.trim().to_lowercase();
        let mut matches = ledger
            .categories
            .iter()
            .filter(|category| category.is_visible_to(owner))
            .filter(|category| category.name.to_lowercase() == needle);
        let first = matches.next()?;
        if first.is_global() {
            matches.find(|category| !category.is_global()).or(Some(first))
        } else {
            Some(first)
        }
    }

    /// Category a purchase may reference: visible, active and of expense kind.
    pub(crate) fn expense_category<'a>(
        ledger: &'a Ledger,
        owner: UserId,
        id: Uuid,
    ) -> BillingResult<&'a Category> {
        let category = Self::visible_category(ledger, owner, id)?;
        if category.kind != CategoryKind::Expense {
            return Err(BillingError::InvalidInput(format!(
                "category {id} is not an expense category"
            )));
        }
        Ok(category)
    }

    /// Category a movement may reference: visible and active.
    pub(crate) fn visible_category<'a>(
        ledger: &'a Ledger,
        owner: UserId,
        id: Uuid,
    ) -> BillingResult<&'a Category> {
        let category = ledger
            .category(id)
            .filter(|category| category.is_visible_to(owner))
            .ok_or_else(|| BillingError::InvalidInput(format!("unknown category {id}")))?;
        if !category.is_active {
            return Err(BillingError::InvalidInput(format!(
                "category {id} is inactive"
            )));
        }
        Ok(category)
    }

    fn owned<'a>(ledger: &'a Ledger, owner: UserId, id: Uuid) -> BillingResult<&'a Category> {
        let category = ledger
            .category(id)
            .ok_or_else(|| BillingError::NotFound(format!("category {id} not found")))?;
        if category.owner_id != Some(owner) {
            return Err(BillingError::Forbidden(format!(
                "category {id} is not owned by the caller"
            )));
        }
        Ok(category)
    }
}
