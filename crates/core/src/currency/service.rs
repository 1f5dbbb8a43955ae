//! Currency registry and currency-aware formatting.
//!
//! Lookup is by integer currency id. Amounts are truncated (rounded toward
//! zero) to a currency's scale; display formatting rounds half-to-even.

use std::collections::BTreeMap;

use mmx_shared::types::{Currency, CurrencyId, Money};

use crate::amount::format::{format_currency, format_ignoring_decimals};

/// In-memory registry of the user's currencies.
#[derive(Debug, Clone, Default)]
pub struct CurrencyService {
    currencies: BTreeMap<CurrencyId, Currency>,
    base_currency: Option<CurrencyId>,
}

impl CurrencyService {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the given currencies.
    #[must_use]
    pub fn with_currencies(currencies: impl IntoIterator<Item = Currency>) -> Self {
        let mut service = Self::new();
        for currency in currencies {
            service.insert(currency);
        }
        service
    }

    /// A small built-in table used when nothing is configured.
    #[must_use]
    pub fn builtin() -> Self {
        let mut service = Self::with_currencies([
            Currency::new(1, "USD").with_name("US dollar").with_symbols("$", ""),
            Currency::new(2, "EUR")
                .with_name("Euro")
                .with_symbols("", " €")
                .with_separators(",", "."),
            Currency::new(3, "GBP").with_name("Pound sterling").with_symbols("£", ""),
            Currency::new(4, "JPY")
                .with_name("Japanese yen")
                .with_symbols("¥", "")
                .with_scale(0),
            Currency::new(5, "CHF")
                .with_name("Swiss franc")
                .with_symbols("Fr. ", "")
                .with_separators(".", "'"),
        ]);
        service.base_currency = Some(CurrencyId(1));
        service
    }

    /// Adds or replaces a currency, returning the previous entry.
    pub fn insert(&mut self, currency: Currency) -> Option<Currency> {
        self.currencies.insert(currency.id, currency)
    }

    /// Looks up a currency.
    #[must_use]
    pub fn get(&self, id: CurrencyId) -> Option<&Currency> {
        self.currencies.get(&id)
    }

    /// Looks up a currency by ISO code, ignoring case.
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&Currency> {
        self.currencies
            .values()
            .find(|c| c.code.eq_ignore_ascii_case(code))
    }

    /// All currencies ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.values()
    }

    /// The base currency, if one is set and known.
    #[must_use]
    pub fn base_currency(&self) -> Option<&Currency> {
        self.base_currency.and_then(|id| self.get(id))
    }

    /// Sets the base currency. Returns false if the id is unknown.
    pub fn set_base_currency(&mut self, id: CurrencyId) -> bool {
        if self.currencies.contains_key(&id) {
            self.base_currency = Some(id);
            true
        } else {
            false
        }
    }

    /// Formats an amount in the given currency, `None` if the id is unknown.
    #[must_use]
    pub fn formatted(&self, id: CurrencyId, amount: Money) -> Option<String> {
        self.get(id).map(|currency| format_currency(amount, currency))
    }

    /// Formats with the currency's symbols and separators but the amount's
    /// own decimals.
    #[must_use]
    pub fn formatted_ignoring_decimals(&self, id: CurrencyId, amount: Money) -> Option<String> {
        self.get(id)
            .map(|currency| format_ignoring_decimals(amount, currency))
    }

    /// Truncates an amount to the currency's scale.
    #[must_use]
    pub fn truncate_to_currency(amount: Money, currency: &Currency) -> Money {
        amount.truncate(currency.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insert_and_get() {
        let mut service = CurrencyService::new();
        assert!(service.insert(Currency::new(7, "NOK")).is_none());
        assert_eq!(service.get(CurrencyId(7)).map(|c| c.code.as_str()), Some("NOK"));
        assert!(service.get(CurrencyId(8)).is_none());

        let replaced = service.insert(Currency::new(7, "SEK"));
        assert_eq!(replaced.map(|c| c.code), Some("NOK".to_string()));
    }

    #[test]
    fn test_find_by_code() {
        let service = CurrencyService::builtin();
        assert_eq!(service.find_by_code("eur").map(|c| c.id), Some(CurrencyId(2)));
        assert!(service.find_by_code("XXX").is_none());
    }

    #[test]
    fn test_base_currency() {
        let mut service = CurrencyService::builtin();
        assert_eq!(service.base_currency().map(|c| c.code.as_str()), Some("USD"));
        assert!(service.set_base_currency(CurrencyId(2)));
        assert_eq!(service.base_currency().map(|c| c.code.as_str()), Some("EUR"));
        assert!(!service.set_base_currency(CurrencyId(99)));
        assert_eq!(service.base_currency().map(|c| c.code.as_str()), Some("EUR"));
    }

    #[test]
    fn test_formatted() {
        let service = CurrencyService::builtin();
        let amount = Money::new(dec!(1234.5));
        assert_eq!(
            service.formatted(CurrencyId(1), amount).as_deref(),
            Some("$1,234.50")
        );
        assert_eq!(
            service.formatted(CurrencyId(2), amount).as_deref(),
            Some("1.234,50 €")
        );
        assert_eq!(
            service.formatted(CurrencyId(4), amount).as_deref(),
            Some("¥1,234")
        );
        assert_eq!(
            service
                .formatted_ignoring_decimals(CurrencyId(5), Money::new(dec!(1234.567)))
                .as_deref(),
            Some("Fr. 1'234.567")
        );
        assert!(service.formatted(CurrencyId(42), amount).is_none());
    }

    #[test]
    fn test_truncate_to_currency() {
        let yen = Currency::new(4, "JPY").with_scale(0);
        let amount = Money::new(dec!(1999.99));
        assert_eq!(
            CurrencyService::truncate_to_currency(amount, &yen).to_string(),
            "1999"
        );
    }
}
