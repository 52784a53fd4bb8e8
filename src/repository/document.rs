use diesel::prelude::*;
use pushkind_common::repository::errors::RepositoryResult;

use crate::{
    domain::{
        delivery_note::DeliveryNote as DomainDeliveryNote, payment::Payment as DomainPayment,
        purchase_order::PurchaseOrder as DomainPurchaseOrder,
        quotation::Quotation as DomainQuotation,
    },
    models::{
        delivery_note::DeliveryNote as DbDeliveryNote, payment::Payment as DbPayment,
        purchase_order::PurchaseOrder as DbPurchaseOrder, quotation::Quotation as DbQuotation,
    },
    repository::{DieselRepository, DocumentReader},
};

impl DocumentReader for DieselRepository {
    fn get_quotation(&self, id: i32) -> RepositoryResult<Option<DomainQuotation>> {
        use crate::schema::quotations;

        let mut conn = self.conn()?;
        let quotation = quotations::table
            .filter(quotations::id.eq(id))
            .first::<DbQuotation>(&mut conn)
            .optional()?;

        Ok(quotation.map(Into::into))
    }

    fn list_quotations(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<DomainQuotation>> {
        use crate::schema::quotations;

        let mut conn = self.conn()?;
        let rows = quotations::table
            .filter(quotations::order_id.eq(order_id))
            .filter(quotations::hub_id.eq(hub_id))
            .order(quotations::id.asc())
            .load::<DbQuotation>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn get_purchase_order(&self, id: i32) -> RepositoryResult<Option<DomainPurchaseOrder>> {
        use crate::schema::purchase_orders;

        let mut conn = self.conn()?;
        let po = purchase_orders::table
            .filter(purchase_orders::id.eq(id))
            .first::<DbPurchaseOrder>(&mut conn)
            .optional()?;

        Ok(po.map(Into::into))
    }

    fn list_purchase_orders(
        &self,
        order_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Vec<DomainPurchaseOrder>> {
        use crate::schema::purchase_orders;

        let mut conn = self.conn()?;
        let rows = purchase_orders::table
            .filter(purchase_orders::order_id.eq(order_id))
            .filter(purchase_orders::hub_id.eq(hub_id))
            .order(purchase_orders::id.asc())
            .load::<DbPurchaseOrder>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn list_delivery_notes(
        &self,
        order_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Vec<DomainDeliveryNote>> {
        use crate::schema::delivery_notes;

        let mut conn = self.conn()?;
        let rows = delivery_notes::table
            .filter(delivery_notes::order_id.eq(order_id))
            .filter(delivery_notes::hub_id.eq(hub_id))
            .order(delivery_notes::id.asc())
            .load::<DbDeliveryNote>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn list_payments(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<DomainPayment>> {
        use crate::schema::payments;

        let mut conn = self.conn()?;
        let rows = payments::table
            .filter(payments::order_id.eq(order_id))
            .filter(payments::hub_id.eq(hub_id))
            .order(payments::id.asc())
            .load::<DbPayment>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
