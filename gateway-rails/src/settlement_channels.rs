//! Settlement channel executors.
//!
//! Each channel returns a channel-specific reference and is idempotent under
//! re-invocation with the same transaction id: the reference is minted once
//! per transaction and handed back unchanged on every retry.

use dashmap::DashMap;
use tracing::info;

use gateway_types::{
    Money, SettlementChannel, SettlementChannelKind, SettlementError, SettlementRecipient,
    TransactionId,
};

use crate::phone::{mask_phone, normalize_msisdn};

fn short_id(transaction_id: TransactionId) -> String {
    transaction_id.to_string().chars().take(8).collect()
}

/// Moves funds between accounts held inside the platform.
#[derive(Default)]
pub struct InternalTransferChannel {
    references: DashMap<TransactionId, String>,
}

#[async_trait::async_trait]
impl SettlementChannel for InternalTransferChannel {
    fn kind(&self) -> SettlementChannelKind {
        SettlementChannelKind::InternalTransfer
    }

    async fn transfer(
        &self,
        transaction_id: TransactionId,
        amount: Money,
        recipient: &SettlementRecipient,
    ) -> Result<String, SettlementError> {
        let Some(account) = &recipient.internal_account else {
            return Err(SettlementError::Rejected {
                channel: self.kind(),
                reason: "recipient has no internal account reference".into(),
            });
        };

        let reference = self
            .references
            .entry(transaction_id)
            .or_insert_with(|| format!("INT-REF-{}", short_id(transaction_id)))
            .clone();

        info!(%transaction_id, account, %amount, reference, "internal transfer settled");
        Ok(reference)
    }
}

/// Pays out to an external bank account.
#[derive(Default)]
pub struct BankSettlementChannel {
    references: DashMap<TransactionId, String>,
}

#[async_trait::async_trait]
impl SettlementChannel for BankSettlementChannel {
    fn kind(&self) -> SettlementChannelKind {
        SettlementChannelKind::BankTransfer
    }

    async fn transfer(
        &self,
        transaction_id: TransactionId,
        amount: Money,
        recipient: &SettlementRecipient,
    ) -> Result<String, SettlementError> {
        let identified = recipient.bank.as_ref().is_some_and(|b| {
            b.iban.is_some() || (b.account_number.is_some() && b.routing_number.is_some())
        });
        if !identified {
            return Err(SettlementError::Rejected {
                channel: self.kind(),
                reason: "recipient bank account is not identified".into(),
            });
        }

        let reference = self
            .references
            .entry(transaction_id)
            .or_insert_with(|| format!("STL-BANK-{}", short_id(transaction_id)))
            .clone();

        info!(%transaction_id, %amount, reference, "bank settlement submitted");
        Ok(reference)
    }
}

/// Pays out to a mobile money wallet.
#[derive(Default)]
pub struct MobileMoneySettlementChannel {
    references: DashMap<TransactionId, String>,
}

#[async_trait::async_trait]
impl SettlementChannel for MobileMoneySettlementChannel {
    fn kind(&self) -> SettlementChannelKind {
        SettlementChannelKind::MobileMoney
    }

    async fn transfer(
        &self,
        transaction_id: TransactionId,
        amount: Money,
        recipient: &SettlementRecipient,
    ) -> Result<String, SettlementError> {
        let (Some(provider), Some(phone)) =
            (recipient.mobile_provider, recipient.phone_number.as_deref())
        else {
            return Err(SettlementError::Rejected {
                channel: self.kind(),
                reason: "recipient is missing mobile money provider or phone number".into(),
            });
        };

        let msisdn = normalize_msisdn(provider, phone).map_err(|e| SettlementError::Rejected {
            channel: self.kind(),
            reason: e.to_string(),
        })?;

        let reference = self
            .references
            .entry(transaction_id)
            .or_insert_with(|| format!("STL-MM-{}", short_id(transaction_id)))
            .clone();

        info!(
            %transaction_id,
            msisdn = %mask_phone(&msisdn),
            %amount,
            reference,
            "mobile money settlement submitted"
        );
        Ok(reference)
    }
}

/// Pays out to an on-chain address.
#[derive(Default)]
pub struct CryptoSettlementChannel {
    references: DashMap<TransactionId, String>,
}

#[async_trait::async_trait]
impl SettlementChannel for CryptoSettlementChannel {
    fn kind(&self) -> SettlementChannelKind {
        SettlementChannelKind::Crypto
    }

    async fn transfer(
        &self,
        transaction_id: TransactionId,
        amount: Money,
        recipient: &SettlementRecipient,
    ) -> Result<String, SettlementError> {
        let Some(address) = recipient.crypto_address.as_deref().filter(|a| !a.is_empty())
        else {
            return Err(SettlementError::Rejected {
                channel: self.kind(),
                reason: "recipient has no crypto address".into(),
            });
        };

        let reference = self
            .references
            .entry(transaction_id)
            .or_insert_with(|| format!("STL-CRYPTO-{}", short_id(transaction_id)))
            .clone();

        info!(%transaction_id, address, %amount, reference, "crypto settlement broadcast");
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_types::{BankDetails, MobileMoneyProvider};
    use gateway_rates::CurrencyCode;

    fn amount() -> Money {
        Money::new(9_680, CurrencyCode::USD).unwrap()
    }

    #[tokio::test]
    async fn test_internal_transfer_is_idempotent() {
        let channel = InternalTransferChannel::default();
        let id = TransactionId::new();
        let recipient = SettlementRecipient {
            internal_account: Some("acct-77".into()),
            ..Default::default()
        };

        let first = channel.transfer(id, amount(), &recipient).await.unwrap();
        let second = channel.transfer(id, amount(), &recipient).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_bank_channel_requires_identified_account() {
        let channel = BankSettlementChannel::default();
        let result = channel
            .transfer(TransactionId::new(), amount(), &SettlementRecipient::default())
            .await;
        assert!(matches!(result, Err(SettlementError::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_bank_reference_shape() {
        let channel = BankSettlementChannel::default();
        let recipient = SettlementRecipient {
            bank: Some(BankDetails {
                iban: Some("DE89370400440532013000".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let reference = channel
            .transfer(TransactionId::new(), amount(), &recipient)
            .await
            .unwrap();
        assert!(reference.starts_with("STL-BANK-"));
    }

    #[tokio::test]
    async fn test_mobile_money_normalizes_recipient_phone() {
        let channel = MobileMoneySettlementChannel::default();
        let recipient = SettlementRecipient {
            mobile_provider: Some(MobileMoneyProvider::Mpesa),
            phone_number: Some("0712345678".into()),
            ..Default::default()
        };
        let reference = channel
            .transfer(TransactionId::new(), amount(), &recipient)
            .await
            .unwrap();
        assert!(reference.starts_with("STL-MM-"));
    }
}
