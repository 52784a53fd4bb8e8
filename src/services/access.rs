//! Who may do what to an order.
//!
//! Callers are resolved into an [`Actor`] once per request and every
//! operation asks [`authorize`] for one [`Capability`] before touching the
//! store.

use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::routes::check_role;

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::customer::NewCustomer;
use crate::domain::history::HistoryActor;
use crate::domain::notification::Recipient;
use crate::domain::order::Order;
use crate::domain::user::{NewUser, UpdateUser};
use crate::repository::{CustomerReader, CustomerWriter, OrderReader, UserReader, UserWriter};
use crate::services::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SubmitOrder,
    ViewOrder,
    /// Staff-only changes: status, stage, quotations, deposits, delivery.
    ManageOrder,
    RespondToQuotation,
    SubmitPurchaseOrder,
    SubmitDepositProof,
    CancelOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffActor {
    pub user_id: i32,
    pub hub_id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientActor {
    pub customer_id: i32,
    pub hub_id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Staff(StaffActor),
    Client(ClientActor),
}

impl Actor {
    pub fn hub_id(&self) -> i32 {
        match self {
            Actor::Staff(staff) => staff.hub_id,
            Actor::Client(client) => client.hub_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Actor::Staff(staff) => &staff.name,
            Actor::Client(client) => &client.name,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Actor::Staff(_))
    }

    pub fn staff_user_id(&self) -> Option<i32> {
        match self {
            Actor::Staff(staff) => Some(staff.user_id),
            Actor::Client(_) => None,
        }
    }

    /// Inbox the actor reads notifications from.
    pub fn recipient(&self) -> Recipient {
        match self {
            Actor::Staff(staff) => Recipient::Staff(staff.user_id),
            Actor::Client(client) => Recipient::Client(client.customer_id),
        }
    }

    /// Actor as recorded in the order history.
    pub fn history_actor(&self) -> HistoryActor {
        match self {
            Actor::Staff(staff) => HistoryActor::staff(staff.user_id, staff.name.clone()),
            Actor::Client(client) => HistoryActor::client(client.name.clone()),
        }
    }

    /// Role part of the capability check, independent of any order.
    pub fn has_capability(&self, capability: Capability) -> bool {
        match (self, capability) {
            (Actor::Staff(_), Capability::SubmitOrder | Capability::RespondToQuotation) => false,
            (Actor::Staff(_), _) => true,
            (Actor::Client(_), Capability::ManageOrder) => false,
            (Actor::Client(_), _) => true,
        }
    }
}

/// Proof that an actor passed the check for one capability on one order.
#[derive(Debug, Clone)]
pub struct Authorized<'a> {
    pub actor: &'a Actor,
    pub capability: Capability,
    pub order_id: i32,
}

impl Authorized<'_> {
    pub fn history_actor(&self) -> HistoryActor {
        self.actor.history_actor()
    }

    pub fn by_client(&self) -> bool {
        !self.actor.is_staff()
    }
}

/// Check that `actor` may exercise `capability` on `order`.
pub fn authorize<'a>(
    actor: &'a Actor,
    capability: Capability,
    order: &Order,
) -> ServiceResult<Authorized<'a>> {
    if actor.hub_id() != order.hub_id {
        return Err(ServiceError::Forbidden);
    }

    if let Actor::Client(client) = actor {
        if client.customer_id != order.customer_id {
            return Err(ServiceError::Forbidden);
        }
    }

    if !actor.has_capability(capability) {
        return Err(ServiceError::Forbidden);
    }

    Ok(Authorized {
        actor,
        capability,
        order_id: order.id,
    })
}

/// Load the order and check `capability` on it.
///
/// Orders of other hubs are reported as forbidden, unknown ids as not found.
pub fn load_authorized<'a, R>(
    repo: &R,
    actor: &'a Actor,
    capability: Capability,
    order_id: i32,
) -> ServiceResult<(Order, Authorized<'a>)>
where
    R: OrderReader + ?Sized,
{
    let order = repo.find_order(order_id)?.ok_or(ServiceError::NotFound)?;
    let authorized = authorize(actor, capability, &order)?;
    Ok((order, authorized))
}

/// Map an authenticated session onto a staff member or a client of its hub.
///
/// Staff rows are created or refreshed from the session; clients are
/// registered on first contact.
pub fn resolve_actor<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Actor>
where
    R: UserReader + UserWriter + CustomerReader + CustomerWriter + ?Sized,
{
    if user.email.trim().is_empty() {
        return Err(ServiceError::Unauthorized);
    }

    if check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        let staff = match repo.get_user_by_email(&user.email, user.hub_id)? {
            Some(existing) if existing.name == user.name && existing.is_admin => existing,
            Some(existing) => repo.update_user(
                existing.id,
                user.hub_id,
                &UpdateUser {
                    name: user.name.clone(),
                    is_admin: true,
                },
            )?,
            None => repo.create_user(&NewUser::from_session(user, true))?,
        };

        return Ok(Actor::Staff(StaffActor {
            user_id: staff.id,
            hub_id: staff.hub_id,
            name: staff.name,
            email: staff.email,
        }));
    }

    let customer = match repo.get_customer_by_email(&user.email, user.hub_id)? {
        Some(customer) => customer,
        None => {
            log::info!("Registering client {} for hub {}", user.email, user.hub_id);
            repo.create_customer(&NewCustomer::from(user))?
        }
    };

    Ok(Actor::Client(ClientActor {
        customer_id: customer.id,
        hub_id: customer.hub_id,
        name: customer.name,
        email: customer.email,
    }))
}

/// Resolve the owner of the order behind a public tracking token.
pub fn resolve_token_client<R>(repo: &R, token: &str) -> ServiceResult<(Actor, Order)>
where
    R: OrderReader + CustomerReader + ?Sized,
{
    let order = repo
        .get_order_by_token(token.trim())?
        .ok_or(ServiceError::NotFound)?;
    let customer = repo
        .get_customer_by_id(order.customer_id, order.hub_id)?
        .ok_or(ServiceError::NotFound)?;

    let actor = Actor::Client(ClientActor {
        customer_id: customer.id,
        hub_id: customer.hub_id,
        name: customer.name,
        email: customer.email,
    });

    Ok((actor, order))
}
