//! Asset metadata and the category weight bookkeeping that defines each
//! asset's target allocation.

use {
    crate::{
        error::Error,
        price_feed::{PriceFeed, PriceKind},
    },
    primitive_types::{H160, U256},
    serde::Deserialize,
    std::collections::HashMap,
};

/// Category an asset is listed under.
///
/// Only `Product`, `Common` and `Usd` assets are "ordinary" and go through
/// tiered pricing. `Base` is reserved for the reserve asset and the share
/// token.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    #[default]
    Unmanaged,
    Product,
    Common,
    Usd,
    Base,
}

impl Category {
    pub fn is_ordinary(self) -> bool {
        matches!(self, Self::Product | Self::Common | Self::Usd)
    }
}

/// A listed asset.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Asset {
    /// Symbol used to look up the asset's price source.
    pub symbol: String,
    pub decimals: u8,
    pub category: Category,
    /// Relative weight of the asset within its category.
    pub weight: u8,
}

/// Relative weights of the three ordinary categories.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CategoryWeights {
    pub product: u8,
    pub common: u8,
    pub usd: u8,
}

impl CategoryWeights {
    pub fn get(&self, category: Category) -> u8 {
        match category {
            Category::Product => self.product,
            Category::Common => self.common,
            Category::Usd => self.usd,
            Category::Unmanaged | Category::Base => 0,
        }
    }

    pub fn sum(&self) -> u16 {
        u16::from(self.product) + u16::from(self.common) + u16::from(self.usd)
    }
}

/// Sum of the in-category weights of all assets listed in each category.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CategoryTotals {
    pub product: u16,
    pub common: u16,
    pub usd: u16,
}

impl CategoryTotals {
    pub fn get(&self, category: Category) -> u16 {
        match category {
            Category::Product => self.product,
            Category::Common => self.common,
            Category::Usd => self.usd,
            Category::Unmanaged | Category::Base => 0,
        }
    }

    fn slot(&mut self, category: Category) -> Option<&mut u16> {
        match category {
            Category::Product => Some(&mut self.product),
            Category::Common => Some(&mut self.common),
            Category::Usd => Some(&mut self.usd),
            Category::Unmanaged | Category::Base => None,
        }
    }

    fn add(&mut self, category: Category, weight: u8) -> Result<(), Error> {
        if let Some(total) = self.slot(category) {
            *total = total
                .checked_add(weight.into())
                .ok_or(Error::WeightOverflow)?;
        }
        Ok(())
    }

    fn remove(&mut self, category: Category, weight: u8) -> Result<(), Error> {
        if let Some(total) = self.slot(category) {
            *total = total
                .checked_sub(weight.into())
                .ok_or(Error::WeightOverflow)?;
        }
        Ok(())
    }
}

/// Read access to the asset registry that pricing depends on.
pub trait AssetRegistry: Send + Sync {
    fn asset(&self, address: H160) -> Option<&Asset>;

    fn category_weights(&self) -> CategoryWeights;

    fn category_totals(&self) -> CategoryTotals;

    /// Address of the reserve asset.
    fn reserve(&self) -> H160;

    /// Address of the share token.
    fn share(&self) -> H160;

    fn get(&self, address: H160) -> Result<&Asset, Error> {
        self.asset(address).ok_or(Error::UnknownAsset(address))
    }

    fn is_base(&self, address: H160) -> bool {
        address == self.reserve() || address == self.share()
    }
}

/// In-memory registry keeping category totals consistent with the listed
/// assets.
#[derive(Clone, Debug)]
pub struct Registry {
    reserve: H160,
    share: H160,
    assets: HashMap<H160, Asset>,
    category_weights: CategoryWeights,
    totals: CategoryTotals,
}

impl Registry {
    pub fn new(reserve: H160, share: H160, category_weights: CategoryWeights) -> Self {
        Self {
            reserve,
            share,
            assets: HashMap::new(),
            category_weights,
            totals: CategoryTotals::default(),
        }
    }

    /// Lists an asset. Ordinary assets need a resolvable price, base assets
    /// are only accepted for the reserve and share addresses.
    pub fn list(&mut self, address: H160, asset: Asset, feed: &PriceFeed) -> Result<(), Error> {
        if self.assets.contains_key(&address) {
            return Err(Error::AssetAlreadyListed(address));
        }
        match asset.category {
            Category::Base if self.is_base(address) => {}
            category if category.is_ordinary() && !self.is_base(address) => {
                feed.resolve(&*self, address, &asset.symbol, PriceKind::Raw)?;
            }
            _ => return Err(Error::InvalidCategory(address)),
        }

        self.totals.add(asset.category, asset.weight)?;
        tracing::debug!(
            asset = ?address,
            symbol = %asset.symbol,
            category = %asset.category,
            weight = asset.weight,
            "listed asset"
        );
        self.assets.insert(address, asset);
        Ok(())
    }

    /// Removes an asset that the pool no longer holds.
    pub fn delist(&mut self, address: H160, pool_balance: U256) -> Result<Asset, Error> {
        let asset = self.get(address)?;
        if asset.category == Category::Base {
            return Err(Error::InvalidCategory(address));
        }
        if !pool_balance.is_zero() {
            return Err(Error::NonZeroBalance(address));
        }

        let (category, weight) = (asset.category, asset.weight);
        self.totals.remove(category, weight)?;
        tracing::debug!(asset = ?address, "delisted asset");
        self.assets
            .remove(&address)
            .ok_or(Error::UnknownAsset(address))
    }

    /// Changes an asset's in-category weight.
    pub fn set_weight(&mut self, address: H160, weight: u8) -> Result<(), Error> {
        let asset = self
            .assets
            .get_mut(&address)
            .ok_or(Error::UnknownAsset(address))?;
        let mut totals = self.totals;
        totals.remove(asset.category, asset.weight)?;
        totals.add(asset.category, weight)?;
        asset.weight = weight;
        self.totals = totals;
        Ok(())
    }

    pub fn set_category_weights(&mut self, weights: CategoryWeights) {
        self.category_weights = weights;
    }

    pub fn assets(&self) -> impl Iterator<Item = (&H160, &Asset)> {
        self.assets.iter()
    }
}

impl AssetRegistry for Registry {
    fn asset(&self, address: H160) -> Option<&Asset> {
        self.assets.get(&address)
    }

    fn category_weights(&self) -> CategoryWeights {
        self.category_weights
    }

    fn category_totals(&self) -> CategoryTotals {
        self.totals
    }

    fn reserve(&self) -> H160 {
        self.reserve
    }

    fn share(&self) -> H160 {
        self.share
    }
}
