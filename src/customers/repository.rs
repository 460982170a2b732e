//! Customer find-or-create: ordered match on
//! identification → email → phone; a match updates fields without ever
//! overwriting a populated field with null.

use sqlx::{PgPool, Row};

use crate::core_types::{CustomerId, TenantId};
use crate::error::{CoreError, CoreResult};

use super::models::Customer;
use super::preferences::PreferencesRepository;
use super::validation::validate_identification;

pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

pub struct CustomerInput {
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub identification: Option<String>,
}

impl<'a> CustomerRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Finds an existing customer by identification, then email, then
    /// phone (in that order); if none match, creates one and its default
    /// notification preferences in the same transaction.
    pub async fn find_or_create(&self, tenant_id: TenantId, input: CustomerInput) -> CoreResult<Customer> {
        if input.phone.is_none() && input.email.is_none() {
            return Err(CoreError::validation(
                "customer requires at least a phone number or an email address",
            ));
        }
        if input.name.trim().is_empty() || input.surname.trim().is_empty() {
            return Err(CoreError::validation("customer name and surname cannot be empty"));
        }

        let identification = input
            .identification
            .as_deref()
            .map(validate_identification)
            .transpose()?;

        if let Some(ref id) = identification {
            if let Some(existing) = self.find_by_identification(tenant_id, id).await? {
                return self.merge_contact_info(existing, &input).await;
            }
        }
        if let Some(ref email) = input.email {
            if let Some(existing) = self.find_by_email(tenant_id, email).await? {
                return self.merge_contact_info(existing, &input).await;
            }
        }
        if let Some(ref phone) = input.phone {
            if let Some(existing) = self.find_by_phone(tenant_id, phone).await? {
                return self.merge_contact_info(existing, &input).await;
            }
        }

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            "INSERT INTO customers (tenant_id, name, surname, phone, email, identification, active) \
             VALUES ($1, $2, $3, $4, $5, $6, true) \
             RETURNING id, tenant_id, name, surname, phone, email, identification, active",
        )
        .bind(tenant_id)
        .bind(&input.name)
        .bind(&input.surname)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&identification)
        .fetch_one(&mut *tx)
        .await?;

        let customer = Self::row_to_customer(&row)?;
        PreferencesRepository::create_defaults(&mut tx, tenant_id, customer.id).await?;
        tx.commit().await?;
        Ok(customer)
    }

    /// Updates a customer's contact fields. Never replaces a populated
    /// field with null - a caller sending `None` means "leave unchanged",
    /// not "clear".
    async fn merge_contact_info(&self, existing: Customer, input: &CustomerInput) -> CoreResult<Customer> {
        let name = if input.name.trim().is_empty() { existing.name } else { input.name.clone() };
        let surname = if input.surname.trim().is_empty() { existing.surname } else { input.surname.clone() };
        let phone = input.phone.clone().or(existing.phone);
        let email = input.email.clone().or(existing.email);
        let identification = input
            .identification
            .as_deref()
            .map(validate_identification)
            .transpose()?
            .or(existing.identification);

        let row = sqlx::query(
            "UPDATE customers SET name = $1, surname = $2, phone = $3, email = $4, identification = $5 \
             WHERE id = $6 AND tenant_id = $7 \
             RETURNING id, tenant_id, name, surname, phone, email, identification, active",
        )
        .bind(&name)
        .bind(&surname)
        .bind(&phone)
        .bind(&email)
        .bind(&identification)
        .bind(existing.id)
        .bind(existing.tenant_id)
        .fetch_one(self.pool)
        .await?;

        Self::row_to_customer(&row)
    }

    async fn find_by_identification(&self, tenant_id: TenantId, identification: &str) -> CoreResult<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, tenant_id, name, surname, phone, email, identification, active \
             FROM customers WHERE tenant_id = $1 AND identification = $2",
        )
        .bind(tenant_id)
        .bind(identification)
        .fetch_optional(self.pool)
        .await?;
        row.map(|r| Self::row_to_customer(&r)).transpose()
    }

    async fn find_by_email(&self, tenant_id: TenantId, email: &str) -> CoreResult<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, tenant_id, name, surname, phone, email, identification, active \
             FROM customers WHERE tenant_id = $1 AND email = $2",
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        row.map(|r| Self::row_to_customer(&r)).transpose()
    }

    async fn find_by_phone(&self, tenant_id: TenantId, phone: &str) -> CoreResult<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, tenant_id, name, surname, phone, email, identification, active \
             FROM customers WHERE tenant_id = $1 AND phone = $2",
        )
        .bind(tenant_id)
        .bind(phone)
        .fetch_optional(self.pool)
        .await?;
        row.map(|r| Self::row_to_customer(&r)).transpose()
    }

    pub async fn find(&self, tenant_id: TenantId, customer_id: CustomerId) -> CoreResult<Customer> {
        let row = sqlx::query(
            "SELECT id, tenant_id, name, surname, phone, email, identification, active \
             FROM customers WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("customer {customer_id}")))?;
        Self::row_to_customer(&row)
    }

    fn row_to_customer(row: &sqlx::postgres::PgRow) -> CoreResult<Customer> {
        Ok(Customer {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            name: row.try_get("name")?,
            surname: row.try_get("surname")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            identification: row.try_get("identification")?,
            active: row.try_get("active")?,
        })
    }
}
