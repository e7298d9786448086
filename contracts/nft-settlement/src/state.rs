use commons::{
    AssetAmount, BasisPoints, ContractTokenId, Credit, CustomContractError, FeeShare, PaymentAsset,
    Token,
};
use concordium_std::*;

use crate::external::{
    DEFAULT_BID_INCREASE, MAX_BATCH_SIZE, MAX_BID_PERIOD, MAX_MIN_PRICE_RATE,
    MAX_SETTABLE_BID_INCREASE,
};
use crate::payout::Settlement;

/// Listing flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum ListingKind {
    /// Competitive bidding with a deadline started by the first qualifying
    /// bid.
    Auction,
    /// Fixed price sale. Never starts a clock, concludes by meeting the ask.
    Sale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct Bid {
    pub bidder: AccountAddress,
    pub amount: AssetAmount,
    /// Account to receive the items instead of the bidder.
    pub recipient: Option<AccountAddress>,
}

impl Bid {
    pub fn item_recipient(&self) -> AccountAddress {
        self.recipient.unwrap_or(self.bidder)
    }
}

/// Conditions the seller listed the tokens under. Fixed price sales store
/// the asking price as the buy now price with a zero minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct SaleTerms {
    pub seller: AccountAddress,
    pub asset: PaymentAsset,
    pub kind: ListingKind,
    pub min_price: AssetAmount,
    pub buy_now_price: Option<AssetAmount>,
    pub bid_period: Duration,
    pub bid_increase: BasisPoints,
    /// Only ever set on sales.
    pub whitelisted_buyer: Option<AccountAddress>,
    pub fees: Vec<FeeShare>,
    /// Extra token IDs sold together with the primary token.
    pub batch: Vec<ContractTokenId>,
}

impl SaleTerms {
    pub fn validate(&self) -> Result<(), CustomContractError> {
        if matches!(self.kind, ListingKind::Auction) {
            ensure!(self.min_price > 0, CustomContractError::ZeroPrice);
        }
        if let Some(buy_now) = self.buy_now_price {
            ensure!(buy_now > 0, CustomContractError::ZeroPrice);
            ensure!(
                MAX_MIN_PRICE_RATE.covers(self.min_price, buy_now),
                CustomContractError::MinPriceTooHigh
            );
        }
        ensure!(
            self.bid_increase <= MAX_SETTABLE_BID_INCREASE,
            CustomContractError::IncreaseTooLarge
        );
        ensure!(
            self.bid_period <= MAX_BID_PERIOD,
            CustomContractError::BidPeriodTooLong
        );
        let mut total_rate = BasisPoints::new(0);
        for fee in self.fees.iter() {
            // Each rate is capped on its own so the total cannot wrap
            ensure!(
                fee.rate <= BasisPoints::whole(),
                CustomContractError::FeeTotalExceeded
            );
            total_rate = total_rate + fee.rate;
        }
        ensure!(
            total_rate <= BasisPoints::whole(),
            CustomContractError::FeeTotalExceeded
        );
        ensure!(
            self.batch.len() < MAX_BATCH_SIZE,
            CustomContractError::BatchTooLarge
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct ListingData {
    pub terms: SaleTerms,
    pub highest_bid: Option<Bid>,
    /// Auction deadline. Unset until a bid meets the minimum price.
    pub end: Option<Timestamp>,
}

/// Sale record for a token. Absence of a record means no custody is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub enum RecordState {
    /// Bid held before any listing exists for the token. Always in CCD.
    EarlyBid(Bid),
    /// Tokens in custody under sale terms.
    Listed(ListingData),
}

/// Result of creating a listing while a bid was already held for the token.
#[must_use]
pub enum CreateOutcome {
    /// Listed. A held bid below the qualifying price stays pending.
    Listed,
    /// A held bid met the minimum price and started the auction clock.
    Live,
    /// A held bid was incompatible with the new terms and must be refunded.
    VoidBid(Bid),
    /// A held bid met the asking price; settle immediately.
    Settle(Settlement),
}

/// Result of placing a bid.
#[must_use]
pub enum BidOutcome {
    /// Stored before any listing exists for the token.
    Early { refund: Option<Bid> },
    /// Stored below the qualifying price.
    Pending { refund: Option<Bid> },
    /// Stored and the auction deadline was set or extended.
    Live { refund: Option<Bid> },
    /// Met the asking or buy now price; settle immediately.
    Settle {
        refund: Option<Bid>,
        settlement: Settlement,
    },
}

/// Result of a seller updating the listing terms.
#[must_use]
pub enum UpdateOutcome {
    Unchanged,
    /// The held bid qualifies under the new terms; the auction clock started.
    Live,
    /// The held bid no longer matches the terms and must be refunded.
    VoidBid(Bid, PaymentAsset),
    /// The held bid meets the new buy now price; settle immediately.
    Settle(Settlement),
}

/// The contract state.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Sale records.
    pub records: StateMap<Token, RecordState, S>,
    /// Depositor of every token currently in custody.
    pub custody: StateMap<Token, AccountAddress, S>,
    /// Funds owed after failed payment deliveries.
    pub credits: StateMap<AccountAddress, Vec<Credit>, S>,
}

impl<S: HasStateApi> State<S> {
    /// Create a new state with no records.
    pub fn new(state_builder: &mut StateBuilder<S>) -> Self {
        State {
            records: state_builder.new_map(),
            custody: state_builder.new_map(),
            credits: state_builder.new_map(),
        }
    }

    /// Create a sale record and take custody of every token in the batch.
    /// A bid held for the token from before the listing is merged according
    /// to the new terms.
    pub fn create_listing(
        &mut self,
        token: &Token,
        terms: SaleTerms,
        slot_time: Timestamp,
    ) -> Result<CreateOutcome, CustomContractError> {
        terms.validate()?;

        if let Some(record) = self.records.get(token) {
            ensure!(
                matches!(&*record, RecordState::EarlyBid(_)),
                CustomContractError::TokenAlreadyListedForSale
            );
        }
        let held = match self.records.remove_and_get(token) {
            Some(RecordState::EarlyBid(bid)) => Some(bid),
            _ => None,
        };

        self.custody.insert(token.clone(), terms.seller);
        for id in terms.batch.iter() {
            self.custody.insert(
                Token {
                    contract: token.contract,
                    id: id.clone(),
                },
                terms.seller,
            );
        }

        let bid = match held {
            None => {
                self.insert_listing(token, terms, None, None);
                return Ok(CreateOutcome::Listed);
            }
            Some(bid) => bid,
        };

        // Early bids are held in CCD, so they cannot pay for a token priced
        // listing. Whitelisted sales drop bids from anyone else.
        let void = terms.asset != PaymentAsset::Ccd
            || match terms.whitelisted_buyer {
                Some(allowed) => {
                    bid.bidder != allowed
                        || bid.amount < terms.buy_now_price.unwrap_or(terms.min_price)
                }
                None => false,
            };
        if void {
            self.insert_listing(token, terms, None, None);
            return Ok(CreateOutcome::VoidBid(bid));
        }

        if terms
            .buy_now_price
            .map_or(false, |price| bid.amount >= price)
        {
            return Ok(CreateOutcome::Settle(self.conclude(token, terms, bid)));
        }

        if matches!(terms.kind, ListingKind::Auction) && bid.amount >= terms.min_price {
            let end = slot_time.checked_add(terms.bid_period).unwrap();
            self.insert_listing(token, terms, Some(bid), Some(end));
            Ok(CreateOutcome::Live)
        } else {
            self.insert_listing(token, terms, Some(bid), None);
            Ok(CreateOutcome::Listed)
        }
    }

    pub fn place_bid(
        &mut self,
        token: &Token,
        bid: Bid,
        asset: PaymentAsset,
        slot_time: Timestamp,
    ) -> Result<BidOutcome, CustomContractError> {
        ensure!(bid.amount > 0, CustomContractError::ZeroBid);

        let mut data = match self.records.get(token).map(|record| record.clone()) {
            None => {
                ensure!(
                    asset == PaymentAsset::Ccd,
                    CustomContractError::WrongPaymentAsset
                );
                self.records.insert(token.clone(), RecordState::EarlyBid(bid));
                return Ok(BidOutcome::Early { refund: None });
            }
            Some(RecordState::EarlyBid(previous)) => {
                ensure!(
                    asset == PaymentAsset::Ccd,
                    CustomContractError::WrongPaymentAsset
                );
                ensure!(
                    bid.amount >= DEFAULT_BID_INCREASE.raise(previous.amount),
                    CustomContractError::BidTooLow
                );
                self.records.insert(token.clone(), RecordState::EarlyBid(bid));
                return Ok(BidOutcome::Early {
                    refund: Some(previous),
                });
            }
            Some(RecordState::Listed(data)) => data,
        };

        ensure_ne!(
            bid.bidder,
            data.terms.seller,
            CustomContractError::SellerCannotBid
        );
        ensure!(
            asset == data.terms.asset,
            CustomContractError::WrongPaymentAsset
        );
        if let Some(end) = data.end {
            ensure!(slot_time < end, CustomContractError::AuctionFinished);
        }
        if let Some(allowed) = data.terms.whitelisted_buyer {
            ensure_eq!(
                bid.bidder,
                allowed,
                CustomContractError::OnlyWhitelistedBuyer
            );
            // Whitelisted sales only accept the full asking price
            let ask = data.terms.buy_now_price.unwrap_or(data.terms.min_price);
            ensure!(bid.amount >= ask, CustomContractError::BidTooLow);
        }
        if let Some(previous) = &data.highest_bid {
            ensure!(
                bid.amount >= data.terms.bid_increase.raise(previous.amount),
                CustomContractError::BidTooLow
            );
        }

        let buy_now_met = data
            .terms
            .buy_now_price
            .map_or(false, |price| bid.amount >= price);
        let refund = data.highest_bid.replace(bid.clone());

        if buy_now_met {
            self.records.remove(token);
            let settlement = self.conclude(token, data.terms, bid);
            Ok(BidOutcome::Settle { refund, settlement })
        } else if matches!(data.terms.kind, ListingKind::Auction)
            && bid.amount >= data.terms.min_price
        {
            // Every qualifying bid restarts the full bid period
            data.end = Some(slot_time.checked_add(data.terms.bid_period).unwrap());
            self.records
                .insert(token.clone(), RecordState::Listed(data));
            Ok(BidOutcome::Live { refund })
        } else {
            self.records
                .insert(token.clone(), RecordState::Listed(data));
            Ok(BidOutcome::Pending { refund })
        }
    }

    pub fn update_minimum_price(
        &mut self,
        token: &Token,
        sender: AccountAddress,
        price: AssetAmount,
        slot_time: Timestamp,
    ) -> Result<UpdateOutcome, CustomContractError> {
        let mut data = self.listed(token)?;
        ensure_eq!(sender, data.terms.seller, CustomContractError::OnlySeller);
        ensure!(
            matches!(data.terms.kind, ListingKind::Auction),
            CustomContractError::NotApplicableForSale
        );
        ensure!(data.end.is_none(), CustomContractError::AuctionHasValidBid);

        data.terms.min_price = price;
        data.terms.validate()?;

        // A pending bid that qualifies under the new price starts the clock
        let outcome = match &data.highest_bid {
            Some(bid) if bid.amount >= price => {
                data.end = Some(slot_time.checked_add(data.terms.bid_period).unwrap());
                UpdateOutcome::Live
            }
            _ => UpdateOutcome::Unchanged,
        };
        self.records
            .insert(token.clone(), RecordState::Listed(data));
        Ok(outcome)
    }

    pub fn update_buy_now_price(
        &mut self,
        token: &Token,
        sender: AccountAddress,
        price: AssetAmount,
    ) -> Result<UpdateOutcome, CustomContractError> {
        let mut data = self.listed(token)?;
        ensure_eq!(sender, data.terms.seller, CustomContractError::OnlySeller);

        data.terms.buy_now_price = Some(price);
        data.terms.validate()?;

        match data.highest_bid.take() {
            Some(bid) if bid.amount >= price => {
                self.records.remove(token);
                Ok(UpdateOutcome::Settle(self.conclude(token, data.terms, bid)))
            }
            held => {
                data.highest_bid = held;
                self.records
                    .insert(token.clone(), RecordState::Listed(data));
                Ok(UpdateOutcome::Unchanged)
            }
        }
    }

    pub fn update_whitelisted_buyer(
        &mut self,
        token: &Token,
        sender: AccountAddress,
        buyer: Option<AccountAddress>,
    ) -> Result<UpdateOutcome, CustomContractError> {
        let mut data = self.listed(token)?;
        ensure_eq!(sender, data.terms.seller, CustomContractError::OnlySeller);
        ensure!(
            matches!(data.terms.kind, ListingKind::Sale),
            CustomContractError::NotASale
        );

        data.terms.whitelisted_buyer = buyer;
        let mismatch = match (&data.highest_bid, &buyer) {
            (Some(bid), Some(allowed)) => bid.bidder != *allowed,
            _ => false,
        };
        let void = if mismatch { data.highest_bid.take() } else { None };
        let asset = data.terms.asset;
        self.records
            .insert(token.clone(), RecordState::Listed(data));

        match void {
            Some(bid) => Ok(UpdateOutcome::VoidBid(bid, asset)),
            None => Ok(UpdateOutcome::Unchanged),
        }
    }

    /// Take the listing down and release custody back to the seller. Not
    /// allowed once a qualifying bid exists. A pending CCD bid stays behind
    /// as an early bid; a pending token bid must be refunded.
    pub fn withdraw_listing(
        &mut self,
        token: &Token,
        sender: AccountAddress,
    ) -> Result<(SaleTerms, Option<Bid>), CustomContractError> {
        let data = self.listed(token)?;
        ensure_eq!(sender, data.terms.seller, CustomContractError::OnlySeller);
        ensure!(data.end.is_none(), CustomContractError::AuctionHasValidBid);

        self.records.remove(token);
        self.release_custody(token, &data.terms.batch);

        let void = match data.highest_bid {
            Some(bid) if data.terms.asset == PaymentAsset::Ccd => {
                self.records
                    .insert(token.clone(), RecordState::EarlyBid(bid));
                None
            }
            held => held,
        };
        Ok((data.terms, void))
    }

    /// Withdraw the held bid. Not allowed once the bid qualifies.
    pub fn withdraw_bid(
        &mut self,
        token: &Token,
        sender: AccountAddress,
    ) -> Result<(Bid, PaymentAsset), CustomContractError> {
        match self.records.get(token).map(|record| record.clone()) {
            None => Err(CustomContractError::UnknownToken),
            Some(RecordState::EarlyBid(bid)) => {
                ensure_eq!(sender, bid.bidder, CustomContractError::OnlyHighestBidder);
                self.records.remove(token);
                Ok((bid, PaymentAsset::Ccd))
            }
            Some(RecordState::Listed(mut data)) => {
                ensure!(data.end.is_none(), CustomContractError::AuctionHasValidBid);
                let bid = match data.highest_bid.take() {
                    Some(bid) => bid,
                    None => bail!(CustomContractError::OnlyHighestBidder),
                };
                ensure_eq!(sender, bid.bidder, CustomContractError::OnlyHighestBidder);
                let asset = data.terms.asset;
                self.records
                    .insert(token.clone(), RecordState::Listed(data));
                Ok((bid, asset))
            }
        }
    }

    /// Seller concludes at the current highest bid, regardless of time.
    pub fn take_highest_bid(
        &mut self,
        token: &Token,
        sender: AccountAddress,
    ) -> Result<Settlement, CustomContractError> {
        let data = self.listed(token)?;
        ensure_eq!(sender, data.terms.seller, CustomContractError::OnlySeller);

        let ListingData {
            terms, highest_bid, ..
        } = data;
        let bid = highest_bid.ok_or(CustomContractError::NoBidToAccept)?;

        self.records.remove(token);
        Ok(self.conclude(token, terms, bid))
    }

    /// Conclude an auction whose deadline has passed. Callable by anyone.
    pub fn settle(
        &mut self,
        token: &Token,
        slot_time: Timestamp,
    ) -> Result<Settlement, CustomContractError> {
        let data = self.listed(token)?;
        let end = data.end.ok_or(CustomContractError::AuctionStillActive)?;
        ensure!(slot_time >= end, CustomContractError::AuctionStillActive);

        let ListingData {
            terms, highest_bid, ..
        } = data;
        // The deadline is only ever set together with a bid
        let bid = highest_bid.ok_or(CustomContractError::NoBidToAccept)?;

        self.records.remove(token);
        Ok(self.conclude(token, terms, bid))
    }

    /// Record funds that could not be delivered.
    pub fn add_credit(&mut self, account: AccountAddress, asset: PaymentAsset, amount: AssetAmount) {
        match self.credits.get_mut(&account) {
            Some(mut credits) => {
                let list = credits.get_mut();
                if let Some(credit) = list.iter_mut().find(|credit| credit.asset == asset) {
                    credit.amount += amount;
                } else {
                    list.push(Credit { asset, amount });
                }
            }
            None => {
                self.credits.insert(account, vec![Credit { asset, amount }]);
            }
        }
    }

    /// Remove and return all credits owed to the account.
    pub fn take_credits(
        &mut self,
        account: &AccountAddress,
    ) -> Result<Vec<Credit>, CustomContractError> {
        self.credits
            .remove_and_get(account)
            .ok_or(CustomContractError::NoCredits)
    }

    pub fn owner_of(&self, token: &Token) -> Result<AccountAddress, CustomContractError> {
        self.custody
            .get(token)
            .map(|depositor| *depositor)
            .ok_or(CustomContractError::ItemNotDeposited)
    }

    pub fn view_record(&self, token: &Token) -> Option<RecordState> {
        self.records.get(token).map(|record| record.clone())
    }

    pub fn view_credits(&self, account: &AccountAddress) -> Vec<Credit> {
        self.credits
            .get(account)
            .map(|credits| credits.clone())
            .unwrap_or_default()
    }

    fn insert_listing(
        &mut self,
        token: &Token,
        terms: SaleTerms,
        highest_bid: Option<Bid>,
        end: Option<Timestamp>,
    ) {
        self.records.insert(
            token.clone(),
            RecordState::Listed(ListingData {
                terms,
                highest_bid,
                end,
            }),
        );
    }

    fn listed(&self, token: &Token) -> Result<ListingData, CustomContractError> {
        let record = self
            .records
            .get(token)
            .ok_or(CustomContractError::UnknownToken)?;
        match &*record {
            RecordState::Listed(data) => Ok(data.clone()),
            RecordState::EarlyBid(_) => Err(CustomContractError::UnknownToken),
        }
    }

    /// Build the settlement for a concluded record and release custody of
    /// the whole batch. The record itself must already be removed.
    fn conclude(&mut self, token: &Token, terms: SaleTerms, bid: Bid) -> Settlement {
        self.release_custody(token, &terms.batch);
        Settlement {
            token: token.clone(),
            batch: terms.batch,
            seller: terms.seller,
            asset: terms.asset,
            price: bid.amount,
            fees: terms.fees,
            recipient: bid.item_recipient(),
            winner: bid.bidder,
        }
    }

    fn release_custody(&mut self, token: &Token, batch: &[ContractTokenId]) {
        self.custody.remove(token);
        for id in batch {
            self.custody.remove(&Token {
                contract: token.contract,
                id: id.clone(),
            });
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_cis1::TokenIdVec;
    use test_infrastructure::*;

    const NFT_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const PAYMENT_CONTRACT: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };

    const SELLER: AccountAddress = AccountAddress([1; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([2; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([3; 32]);

    fn token() -> Token {
        Token {
            contract: NFT_CONTRACT,
            id: TokenIdVec(vec![1]),
        }
    }

    fn time(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    fn bid(bidder: AccountAddress, amount: AssetAmount) -> Bid {
        Bid {
            bidder,
            amount,
            recipient: None,
        }
    }

    fn auction_terms(min_price: AssetAmount) -> SaleTerms {
        SaleTerms {
            seller: SELLER,
            asset: PaymentAsset::Ccd,
            kind: ListingKind::Auction,
            min_price,
            buy_now_price: None,
            bid_period: Duration::from_hours(24),
            bid_increase: BasisPoints::new(100),
            whitelisted_buyer: None,
            fees: Vec::new(),
            batch: Vec::new(),
        }
    }

    fn sale_terms(price: AssetAmount) -> SaleTerms {
        SaleTerms {
            seller: SELLER,
            asset: PaymentAsset::Ccd,
            kind: ListingKind::Sale,
            min_price: 0,
            buy_now_price: Some(price),
            bid_period: Duration::from_hours(24),
            bid_increase: BasisPoints::new(100),
            whitelisted_buyer: None,
            fees: Vec::new(),
            batch: Vec::new(),
        }
    }

    fn new_state() -> State<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        State::new(&mut state_builder)
    }

    #[concordium_test]
    fn test_create_rejects_duplicate() {
        let mut state = new_state();

        let outcome = state.create_listing(&token(), auction_terms(10_000), time(0));
        claim!(matches!(outcome, Ok(CreateOutcome::Listed)));

        let outcome = state.create_listing(&token(), auction_terms(20_000), time(0));
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::TokenAlreadyListedForSale)
        );
    }

    #[concordium_test]
    fn test_create_validates_prices() {
        let mut state = new_state();

        let outcome = state.create_listing(&token(), auction_terms(0), time(0));
        claim_eq!(outcome.err(), Some(CustomContractError::ZeroPrice));

        // Minimum price must stay within 80% of the buy now price
        let mut terms = auction_terms(8_001);
        terms.buy_now_price = Some(10_000);
        let outcome = state.create_listing(&token(), terms, time(0));
        claim_eq!(outcome.err(), Some(CustomContractError::MinPriceTooHigh));

        let mut terms = auction_terms(8_000);
        terms.buy_now_price = Some(10_000);
        let outcome = state.create_listing(&token(), terms, time(0));
        claim!(outcome.is_ok());
    }

    #[concordium_test]
    fn test_create_rejects_wrapping_fee_rates() {
        let mut state = new_state();

        // Two rates whose u64 sum wraps back to zero must not pass the cap
        let mut terms = auction_terms(10_000);
        terms.fees = vec![
            FeeShare {
                account: BIDDER_1,
                rate: BasisPoints::new(1 << 63),
            },
            FeeShare {
                account: BIDDER_2,
                rate: BasisPoints::new(1 << 63),
            },
        ];
        let outcome = state.create_listing(&token(), terms, time(0));
        claim_eq!(outcome.err(), Some(CustomContractError::FeeTotalExceeded));
    }

    #[concordium_test]
    fn test_create_bounds_increase_and_period() {
        let mut state = new_state();

        let mut terms = auction_terms(10_000);
        terms.bid_increase = BasisPoints::new(10_001);
        let outcome = state.create_listing(&token(), terms, time(0));
        claim_eq!(outcome.err(), Some(CustomContractError::IncreaseTooLarge));

        // An absurd duration would overflow the deadline on the first bid
        let mut terms = auction_terms(10_000);
        terms.bid_period = Duration::from_millis(u64::MAX);
        let outcome = state.create_listing(&token(), terms, time(0));
        claim_eq!(outcome.err(), Some(CustomContractError::BidPeriodTooLong));
    }

    #[concordium_test]
    fn test_create_takes_custody_of_batch() {
        let mut state = new_state();

        let mut terms = auction_terms(10_000);
        terms.batch = vec![TokenIdVec(vec![2]), TokenIdVec(vec![3])];
        let outcome = state.create_listing(&token(), terms, time(0));
        claim!(outcome.is_ok());

        claim_eq!(state.owner_of(&token()), Ok(SELLER));
        claim_eq!(
            state.owner_of(&Token {
                contract: NFT_CONTRACT,
                id: TokenIdVec(vec![3]),
            }),
            Ok(SELLER)
        );
        claim_eq!(
            state.owner_of(&Token {
                contract: NFT_CONTRACT,
                id: TokenIdVec(vec![4]),
            }),
            Err(CustomContractError::ItemNotDeposited)
        );
    }

    #[concordium_test]
    fn test_bid_below_minimum_stays_pending() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");

        let outcome = state.place_bid(&token(), bid(BIDDER_1, 5_000), PaymentAsset::Ccd, time(10));
        claim!(matches!(outcome, Ok(BidOutcome::Pending { refund: None })));

        match state.view_record(&token()) {
            Some(RecordState::Listed(data)) => {
                claim_eq!(data.highest_bid, Some(bid(BIDDER_1, 5_000)));
                claim_eq!(data.end, None);
            }
            _ => fail!("Expected a listed record"),
        }
    }

    #[concordium_test]
    fn test_qualifying_bid_starts_clock() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");

        let outcome = state.place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(10));
        claim!(matches!(outcome, Ok(BidOutcome::Live { refund: None })));

        match state.view_record(&token()) {
            Some(RecordState::Listed(data)) => {
                claim_eq!(data.end, Some(time(10).checked_add(Duration::from_hours(24)).unwrap()));
            }
            _ => fail!("Expected a listed record"),
        }
    }

    #[concordium_test]
    fn test_outbid_returns_previous_bid_and_extends() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(10))
            .expect_report("First bid failed");

        // One percent over the previous bid is the default floor
        let outcome = state.place_bid(&token(), bid(BIDDER_2, 10_099), PaymentAsset::Ccd, time(20));
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::BidTooLow)
        );

        let outcome = state.place_bid(&token(), bid(BIDDER_2, 10_100), PaymentAsset::Ccd, time(20));
        match outcome {
            Ok(BidOutcome::Live { refund }) => claim_eq!(refund, Some(bid(BIDDER_1, 10_000))),
            _ => fail!("Expected a live outcome"),
        }

        match state.view_record(&token()) {
            Some(RecordState::Listed(data)) => {
                claim_eq!(data.end, Some(time(20).checked_add(Duration::from_hours(24)).unwrap()));
            }
            _ => fail!("Expected a listed record"),
        }
    }

    #[concordium_test]
    fn test_seller_cannot_bid() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");

        let outcome = state.place_bid(&token(), bid(SELLER, 10_000), PaymentAsset::Ccd, time(10));
        claim_eq!(outcome.err(), Some(CustomContractError::SellerCannotBid));
    }

    #[concordium_test]
    fn test_bid_after_deadline_rejected() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(10))
            .expect_report("First bid failed");

        let late = time(10)
            .checked_add(Duration::from_hours(24))
            .unwrap();
        let outcome = state.place_bid(&token(), bid(BIDDER_2, 20_000), PaymentAsset::Ccd, late);
        claim_eq!(outcome.err(), Some(CustomContractError::AuctionFinished));
    }

    #[concordium_test]
    fn test_buy_now_settles() {
        let mut state = new_state();
        let mut terms = auction_terms(8_000);
        terms.buy_now_price = Some(10_000);
        state
            .create_listing(&token(), terms, time(0))
            .expect_report("Failed to create listing");

        let outcome = state.place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(10));
        match outcome {
            Ok(BidOutcome::Settle { refund, settlement }) => {
                claim_eq!(refund, None);
                claim_eq!(settlement.price, 10_000);
                claim_eq!(settlement.winner, BIDDER_1);
                claim_eq!(settlement.recipient, BIDDER_1);
                claim_eq!(settlement.seller, SELLER);
            }
            _ => fail!("Expected a settle outcome"),
        }
        claim_eq!(state.view_record(&token()), None);
        claim_eq!(
            state.owner_of(&token()),
            Err(CustomContractError::ItemNotDeposited)
        );
    }

    #[concordium_test]
    fn test_custom_bid_recipient() {
        let mut state = new_state();
        state
            .create_listing(&token(), sale_terms(10_000), time(0))
            .expect_report("Failed to create listing");

        let custom = Bid {
            bidder: BIDDER_1,
            amount: 10_000,
            recipient: Some(BIDDER_2),
        };
        let outcome = state.place_bid(&token(), custom, PaymentAsset::Ccd, time(10));
        match outcome {
            Ok(BidOutcome::Settle { settlement, .. }) => {
                claim_eq!(settlement.winner, BIDDER_1);
                claim_eq!(settlement.recipient, BIDDER_2);
            }
            _ => fail!("Expected a settle outcome"),
        }
    }

    #[concordium_test]
    fn test_open_sale_allows_pending_below_ask() {
        let mut state = new_state();
        state
            .create_listing(&token(), sale_terms(10_000), time(0))
            .expect_report("Failed to create listing");

        let outcome = state.place_bid(&token(), bid(BIDDER_1, 5_000), PaymentAsset::Ccd, time(10));
        claim!(matches!(outcome, Ok(BidOutcome::Pending { refund: None })));

        // Sales never start a clock
        match state.view_record(&token()) {
            Some(RecordState::Listed(data)) => claim_eq!(data.end, None),
            _ => fail!("Expected a listed record"),
        }
    }

    #[concordium_test]
    fn test_whitelisted_sale_rules() {
        let mut state = new_state();
        let mut terms = sale_terms(10_000);
        terms.whitelisted_buyer = Some(BIDDER_1);
        state
            .create_listing(&token(), terms, time(0))
            .expect_report("Failed to create listing");

        let outcome = state.place_bid(&token(), bid(BIDDER_2, 10_000), PaymentAsset::Ccd, time(10));
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::OnlyWhitelistedBuyer)
        );

        let outcome = state.place_bid(&token(), bid(BIDDER_1, 9_999), PaymentAsset::Ccd, time(10));
        claim_eq!(outcome.err(), Some(CustomContractError::BidTooLow));

        let outcome = state.place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(10));
        claim!(matches!(outcome, Ok(BidOutcome::Settle { .. })));
    }

    #[concordium_test]
    fn test_wrong_asset_rejected() {
        let mut state = new_state();
        let mut terms = auction_terms(10_000);
        terms.asset = PaymentAsset::Token(PAYMENT_CONTRACT);
        state
            .create_listing(&token(), terms, time(0))
            .expect_report("Failed to create listing");

        let outcome = state.place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(10));
        claim_eq!(outcome.err(), Some(CustomContractError::WrongPaymentAsset));

        let outcome = state.place_bid(
            &token(),
            bid(BIDDER_1, 10_000),
            PaymentAsset::Token(PAYMENT_CONTRACT),
            time(10),
        );
        claim!(matches!(outcome, Ok(BidOutcome::Live { .. })));
    }

    #[concordium_test]
    fn test_early_bid_then_listing() {
        let mut state = new_state();

        let outcome = state.place_bid(&token(), bid(BIDDER_1, 9_000), PaymentAsset::Ccd, time(0));
        claim!(matches!(outcome, Ok(BidOutcome::Early { refund: None })));

        // Held bid is below the minimum, listing stays pending
        let outcome = state.create_listing(&token(), auction_terms(10_000), time(10));
        claim!(matches!(outcome, Ok(CreateOutcome::Listed)));
        match state.view_record(&token()) {
            Some(RecordState::Listed(data)) => {
                claim_eq!(data.highest_bid, Some(bid(BIDDER_1, 9_000)));
                claim_eq!(data.end, None);
            }
            _ => fail!("Expected a listed record"),
        }

        // Lowering the minimum price below the held bid starts the clock
        let outcome = state.update_minimum_price(&token(), SELLER, 9_000, time(20));
        claim!(matches!(outcome, Ok(UpdateOutcome::Live)));
        match state.view_record(&token()) {
            Some(RecordState::Listed(data)) => claim!(data.end.is_some()),
            _ => fail!("Expected a listed record"),
        }
    }

    #[concordium_test]
    fn test_early_bid_replacement_needs_raise() {
        let mut state = new_state();
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(0))
            .expect_report("Early bid failed");

        let outcome = state.place_bid(&token(), bid(BIDDER_2, 10_000), PaymentAsset::Ccd, time(5));
        claim_eq!(outcome.err(), Some(CustomContractError::BidTooLow));

        let outcome = state.place_bid(&token(), bid(BIDDER_2, 10_100), PaymentAsset::Ccd, time(5));
        match outcome {
            Ok(BidOutcome::Early { refund }) => claim_eq!(refund, Some(bid(BIDDER_1, 10_000))),
            _ => fail!("Expected an early outcome"),
        }
    }

    #[concordium_test]
    fn test_early_bid_voided_for_token_listing() {
        let mut state = new_state();
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(0))
            .expect_report("Early bid failed");

        let mut terms = auction_terms(5_000);
        terms.asset = PaymentAsset::Token(PAYMENT_CONTRACT);
        let outcome = state.create_listing(&token(), terms, time(10));
        match outcome {
            Ok(CreateOutcome::VoidBid(voided)) => claim_eq!(voided, bid(BIDDER_1, 10_000)),
            _ => fail!("Expected a void outcome"),
        }
    }

    #[concordium_test]
    fn test_early_bid_settles_sale_on_create() {
        let mut state = new_state();
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(0))
            .expect_report("Early bid failed");

        let outcome = state.create_listing(&token(), sale_terms(10_000), time(10));
        match outcome {
            Ok(CreateOutcome::Settle(settlement)) => {
                claim_eq!(settlement.winner, BIDDER_1);
                claim_eq!(settlement.price, 10_000);
            }
            _ => fail!("Expected a settle outcome"),
        }
        claim_eq!(state.view_record(&token()), None);
    }

    #[concordium_test]
    fn test_update_minimum_price_rules() {
        let mut state = new_state();
        state
            .create_listing(&token(), sale_terms(10_000), time(0))
            .expect_report("Failed to create listing");

        let outcome = state.update_minimum_price(&token(), SELLER, 5_000, time(10));
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::NotApplicableForSale)
        );

        let auction = Token {
            contract: NFT_CONTRACT,
            id: TokenIdVec(vec![9]),
        };
        state
            .create_listing(&auction, auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");

        let outcome = state.update_minimum_price(&auction, BIDDER_1, 5_000, time(10));
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::OnlySeller)
        );

        let _ = state
            .place_bid(&auction, bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(10))
            .expect_report("Bid failed");
        let outcome = state.update_minimum_price(&auction, SELLER, 5_000, time(20));
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::AuctionHasValidBid)
        );
    }

    #[concordium_test]
    fn test_update_buy_now_settles_on_met_bid() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 9_000), PaymentAsset::Ccd, time(10))
            .expect_report("Bid failed");

        let outcome = state.update_buy_now_price(&token(), SELLER, 12_000);
        claim!(matches!(outcome, Ok(UpdateOutcome::Unchanged)));

        let outcome = state.update_buy_now_price(&token(), SELLER, 9_000);
        match outcome {
            Ok(UpdateOutcome::Settle(settlement)) => claim_eq!(settlement.price, 9_000),
            _ => fail!("Expected a settle outcome"),
        }
    }

    #[concordium_test]
    fn test_update_whitelisted_buyer_voids_mismatched_bid() {
        let mut state = new_state();
        state
            .create_listing(&token(), sale_terms(10_000), time(0))
            .expect_report("Failed to create listing");
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 5_000), PaymentAsset::Ccd, time(10))
            .expect_report("Bid failed");

        let outcome = state.update_whitelisted_buyer(&token(), SELLER, Some(BIDDER_2));
        match outcome {
            Ok(UpdateOutcome::VoidBid(voided, asset)) => {
                claim_eq!(voided, bid(BIDDER_1, 5_000));
                claim_eq!(asset, PaymentAsset::Ccd);
            }
            _ => fail!("Expected a void outcome"),
        }
    }

    #[concordium_test]
    fn test_withdraw_listing_keeps_pending_bid_as_early() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 5_000), PaymentAsset::Ccd, time(10))
            .expect_report("Bid failed");

        let (terms, void) = state
            .withdraw_listing(&token(), SELLER)
            .expect_report("Withdraw failed");
        claim_eq!(terms.seller, SELLER);
        claim_eq!(void, None);
        claim_eq!(
            state.view_record(&token()),
            Some(RecordState::EarlyBid(bid(BIDDER_1, 5_000)))
        );
        claim_eq!(
            state.owner_of(&token()),
            Err(CustomContractError::ItemNotDeposited)
        );
    }

    #[concordium_test]
    fn test_withdraw_listing_rejected_after_valid_bid() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(10))
            .expect_report("Bid failed");

        let outcome = state.withdraw_listing(&token(), SELLER);
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::AuctionHasValidBid)
        );
    }

    #[concordium_test]
    fn test_withdraw_bid_rules() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 5_000), PaymentAsset::Ccd, time(10))
            .expect_report("Bid failed");

        let outcome = state.withdraw_bid(&token(), BIDDER_2);
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::OnlyHighestBidder)
        );

        let (withdrawn, asset) = state
            .withdraw_bid(&token(), BIDDER_1)
            .expect_report("Withdraw failed");
        claim_eq!(withdrawn, bid(BIDDER_1, 5_000));
        claim_eq!(asset, PaymentAsset::Ccd);
        match state.view_record(&token()) {
            Some(RecordState::Listed(data)) => claim_eq!(data.highest_bid, None),
            _ => fail!("Expected a listed record"),
        }
    }

    #[concordium_test]
    fn test_settle_requires_deadline() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");
        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 10_000), PaymentAsset::Ccd, time(10))
            .expect_report("Bid failed");

        let outcome = state.settle(&token(), time(20));
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::AuctionStillActive)
        );

        let deadline = time(10).checked_add(Duration::from_hours(24)).unwrap();
        let settlement = state.settle(&token(), deadline).expect_report("Settle failed");
        claim_eq!(settlement.winner, BIDDER_1);
        claim_eq!(settlement.price, 10_000);
    }

    #[concordium_test]
    fn test_take_highest_bid_ignores_time() {
        let mut state = new_state();
        state
            .create_listing(&token(), auction_terms(10_000), time(0))
            .expect_report("Failed to create listing");

        let outcome = state.take_highest_bid(&token(), SELLER);
        claim_eq!(
            outcome.err(),
            Some(CustomContractError::NoBidToAccept)
        );

        let _ = state
            .place_bid(&token(), bid(BIDDER_1, 5_000), PaymentAsset::Ccd, time(10))
            .expect_report("Bid failed");
        let settlement = state
            .take_highest_bid(&token(), SELLER)
            .expect_report("Accepting the bid failed");
        claim_eq!(settlement.price, 5_000);
    }

    #[concordium_test]
    fn test_credits_accumulate_and_clear() {
        let mut state = new_state();

        claim_eq!(
            state.take_credits(&BIDDER_1).err(),
            Some(CustomContractError::NoCredits)
        );

        state.add_credit(BIDDER_1, PaymentAsset::Ccd, 1_000);
        state.add_credit(BIDDER_1, PaymentAsset::Ccd, 500);
        state.add_credit(BIDDER_1, PaymentAsset::Token(PAYMENT_CONTRACT), 200);

        let credits = state
            .take_credits(&BIDDER_1)
            .expect_report("Taking credits failed");
        claim_eq!(
            credits,
            vec![
                Credit {
                    asset: PaymentAsset::Ccd,
                    amount: 1_500,
                },
                Credit {
                    asset: PaymentAsset::Token(PAYMENT_CONTRACT),
                    amount: 200,
                },
            ]
        );

        // Second withdrawal finds nothing
        claim_eq!(
            state.take_credits(&BIDDER_1).err(),
            Some(CustomContractError::NoCredits)
        );
    }
}
