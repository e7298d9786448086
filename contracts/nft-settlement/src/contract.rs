use commons::{AssetAmount, Credit, CustomContractError, PaymentAsset, Token};
use concordium_cis1::{OnReceivingCis1Params, TokenIdVec};
use concordium_std::*;

use crate::events::*;
use crate::external::*;
use crate::nft;
use crate::payout;
use crate::state::{
    Bid, BidOutcome, CreateOutcome, ListingKind, RecordState, SaleTerms, State, UpdateOutcome,
};
use crate::token;

/// Initialize the settlement contract with no sale records.
#[init(contract = "NftSettlement")]
fn contract_init<S: HasStateApi>(
    _ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    Ok(State::new(state_builder))
}

#[receive(
    mutable,
    contract = "NftSettlement",
    name = "createAuction",
    parameter = "CreateAuctionParams",
    enable_logger
)]
fn contract_create_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = CreateAuctionParams::deserial(&mut ctx.parameter_cursor())?;
    let seller = account_caller(ctx)?;

    let bid_increase = match params.bid_increase {
        Some(increase) => {
            ensure!(
                increase >= MIN_SETTABLE_BID_INCREASE,
                CustomContractError::IncreaseBelowFloor.into()
            );
            increase
        }
        None => DEFAULT_BID_INCREASE,
    };

    let terms = SaleTerms {
        seller,
        asset: params.asset,
        kind: ListingKind::Auction,
        min_price: params.min_price,
        buy_now_price: params.buy_now_price,
        bid_period: params.bid_period.unwrap_or(DEFAULT_BID_PERIOD),
        bid_increase,
        whitelisted_buyer: None,
        fees: params.fees,
        batch: params.batch,
    };

    create_listing(ctx, host, logger, params.token, terms)
}

#[receive(
    mutable,
    contract = "NftSettlement",
    name = "createSale",
    parameter = "CreateSaleParams",
    enable_logger
)]
fn contract_create_sale<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = CreateSaleParams::deserial(&mut ctx.parameter_cursor())?;
    let seller = account_caller(ctx)?;

    let terms = SaleTerms {
        seller,
        asset: params.asset,
        kind: ListingKind::Sale,
        min_price: 0,
        buy_now_price: Some(params.price),
        bid_period: DEFAULT_BID_PERIOD,
        bid_increase: DEFAULT_BID_INCREASE,
        whitelisted_buyer: params.whitelisted_buyer,
        fees: params.fees,
        batch: params.batch,
    };

    create_listing(ctx, host, logger, params.token, terms)
}

#[receive(
    mutable,
    payable,
    contract = "NftSettlement",
    name = "bid",
    parameter = "BidParams",
    enable_logger
)]
fn contract_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = BidParams::deserial(&mut ctx.parameter_cursor())?;
    make_bid(
        ctx,
        host,
        logger,
        params.token,
        params.asset,
        params.amount,
        amount,
        None,
    )
}

#[receive(
    mutable,
    payable,
    contract = "NftSettlement",
    name = "customBid",
    parameter = "CustomBidParams",
    enable_logger
)]
fn contract_custom_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = CustomBidParams::deserial(&mut ctx.parameter_cursor())?;
    make_bid(
        ctx,
        host,
        logger,
        params.token,
        params.asset,
        params.amount,
        amount,
        Some(params.recipient),
    )
}

#[receive(
    mutable,
    contract = "NftSettlement",
    name = "updateMinimumPrice",
    parameter = "UpdatePriceParams",
    enable_logger
)]
fn contract_update_minimum_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = UpdatePriceParams::deserial(&mut ctx.parameter_cursor())?;
    let sender = account_caller(ctx)?;

    let outcome = host.state_mut().update_minimum_price(
        &params.token,
        sender,
        params.price,
        ctx.metadata().slot_time(),
    )?;

    apply_update_outcome(ctx, host, logger, &params.token, outcome)
}

#[receive(
    mutable,
    contract = "NftSettlement",
    name = "updateBuyNowPrice",
    parameter = "UpdatePriceParams",
    enable_logger
)]
fn contract_update_buy_now_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = UpdatePriceParams::deserial(&mut ctx.parameter_cursor())?;
    let sender = account_caller(ctx)?;

    let outcome = host
        .state_mut()
        .update_buy_now_price(&params.token, sender, params.price)?;

    apply_update_outcome(ctx, host, logger, &params.token, outcome)
}

#[receive(
    mutable,
    contract = "NftSettlement",
    name = "updateWhitelistedBuyer",
    parameter = "UpdateWhitelistedBuyerParams",
    enable_logger
)]
fn contract_update_whitelisted_buyer<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = UpdateWhitelistedBuyerParams::deserial(&mut ctx.parameter_cursor())?;
    let sender = account_caller(ctx)?;

    let outcome = host
        .state_mut()
        .update_whitelisted_buyer(&params.token, sender, params.buyer)?;

    apply_update_outcome(ctx, host, logger, &params.token, outcome)
}

/// Take an unsold listing down and return the tokens to the seller.
#[receive(
    mutable,
    contract = "NftSettlement",
    name = "withdrawItem",
    parameter = "Token",
    enable_logger
)]
fn contract_withdraw_item<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    withdraw_listing(ctx, host, logger)
}

/// Same transition as `withdrawItem`, kept as a separate entrypoint so that
/// tearing down an auction reads as such on the caller side.
#[receive(
    mutable,
    contract = "NftSettlement",
    name = "withdrawAuction",
    parameter = "Token",
    enable_logger
)]
fn contract_withdraw_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    withdraw_listing(ctx, host, logger)
}

#[receive(
    mutable,
    contract = "NftSettlement",
    name = "withdrawBid",
    parameter = "Token",
    enable_logger
)]
fn contract_withdraw_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let token = Token::deserial(&mut ctx.parameter_cursor())?;
    let sender = account_caller(ctx)?;

    let (bid, asset) = host.state_mut().withdraw_bid(&token, sender)?;

    logger.log(&SettlementEvents::bid_refund(
        &token.contract,
        &token.id,
        &bid.bidder,
        bid.amount,
    ))?;

    payout::deliver_or_credit(
        host,
        ctx.self_address(),
        asset,
        &bid.bidder,
        bid.amount,
        logger,
    )
}

/// Seller concludes the listing at the current highest bid, regardless of
/// price and time.
#[receive(
    mutable,
    contract = "NftSettlement",
    name = "takeHighestBid",
    parameter = "Token",
    enable_logger
)]
fn contract_take_highest_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let token = Token::deserial(&mut ctx.parameter_cursor())?;
    let sender = account_caller(ctx)?;

    let settlement = host.state_mut().take_highest_bid(&token, sender)?;

    payout::execute(host, ctx.self_address(), settlement, logger)
}

/// Conclude an auction whose deadline has passed. Callable by anyone.
#[receive(
    mutable,
    contract = "NftSettlement",
    name = "settleAuction",
    parameter = "Token",
    enable_logger
)]
fn contract_settle_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let token = Token::deserial(&mut ctx.parameter_cursor())?;

    let settlement = host
        .state_mut()
        .settle(&token, ctx.metadata().slot_time())?;

    payout::execute(host, ctx.self_address(), settlement, logger)
}

/// Pay out everything owed to the caller after failed payment deliveries.
/// Unlike settlement payments, a failing delivery here rolls the whole
/// withdrawal back, so nothing is ever lost or paid twice.
#[receive(
    mutable,
    contract = "NftSettlement",
    name = "withdrawAllFailedCredits",
    enable_logger
)]
fn contract_withdraw_all_failed_credits<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let caller = account_caller(ctx)?;

    let credits = host.state_mut().take_credits(&caller)?;

    logger.log(&SettlementEvents::credit_withdraw(&caller, &credits))?;

    for credit in credits {
        payout::deliver(
            host,
            ctx.self_address(),
            credit.asset,
            &caller,
            credit.amount,
        )?;
    }

    Ok(())
}

/// Receive hook for CIS-1 transfers targeting this contract. Tokens only
/// ever arrive through transfers this contract invoked itself, so the hook
/// only checks that it is called by a contract.
#[receive(
    contract = "NftSettlement",
    name = "onCis1Received",
    parameter = "OnReceivingCis1Params<TokenIdVec>"
)]
fn contract_on_cis1_received<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    _host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    ensure!(
        matches!(ctx.sender(), Address::Contract(_)),
        CustomContractError::ContractOnly.into()
    );
    Ok(())
}

/// View the sale record for a token.
#[receive(
    contract = "NftSettlement",
    name = "getAuctionRecord",
    parameter = "Token",
    return_value = "Option<RecordState>"
)]
fn contract_get_auction_record<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Option<RecordState>> {
    let token = Token::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().view_record(&token))
}

/// View the depositor of a token in custody.
#[receive(
    contract = "NftSettlement",
    name = "ownerOfItem",
    parameter = "Token",
    return_value = "AccountAddress"
)]
fn contract_owner_of_item<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<AccountAddress> {
    let token = Token::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().owner_of(&token)?)
}

/// View the credits owed to an account after failed payment deliveries.
#[receive(
    contract = "NftSettlement",
    name = "viewCredits",
    parameter = "AccountAddress",
    return_value = "Vec<Credit>"
)]
fn contract_view_credits<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Vec<Credit>> {
    let account = AccountAddress::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().view_credits(&account))
}

fn account_caller(ctx: &impl HasReceiveContext) -> Result<AccountAddress, CustomContractError> {
    if let Address::Account(account) = ctx.sender() {
        Ok(account)
    } else {
        Err(CustomContractError::OnlyAccountAddress)
    }
}

/// Record the listing, pull every token of the batch into custody and act
/// on a bid held for the token from before the listing.
fn create_listing<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
    token: Token,
    terms: SaleTerms,
) -> ReceiveResult<()> {
    let seller = terms.seller;
    let kind = terms.kind;
    let asset = terms.asset;
    let price = match kind {
        ListingKind::Auction => terms.min_price,
        ListingKind::Sale => terms.buy_now_price.unwrap_or(terms.min_price),
    };
    let batch = terms.batch.clone();

    let outcome = host
        .state_mut()
        .create_listing(&token, terms, ctx.metadata().slot_time())?;

    // Custody is recorded, now pull the tokens
    nft::deposit(
        host,
        &token.contract,
        token.id.clone(),
        seller,
        ctx.self_address(),
    )?;
    for id in batch {
        nft::deposit(host, &token.contract, id, seller, ctx.self_address())?;
    }

    logger.log(&SettlementEvents::listing(
        &token.contract,
        &token.id,
        &seller,
        kind,
        asset,
        price,
    ))?;

    match outcome {
        CreateOutcome::Listed | CreateOutcome::Live => Ok(()),
        CreateOutcome::VoidBid(bid) => {
            logger.log(&SettlementEvents::bid_refund(
                &token.contract,
                &token.id,
                &bid.bidder,
                bid.amount,
            ))?;
            // Early bids are held in CCD
            payout::deliver_or_credit(
                host,
                ctx.self_address(),
                PaymentAsset::Ccd,
                &bid.bidder,
                bid.amount,
                logger,
            )
        }
        CreateOutcome::Settle(settlement) => {
            payout::execute(host, ctx.self_address(), settlement, logger)
        }
    }
}

fn make_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
    token: Token,
    asset: PaymentAsset,
    declared: AssetAmount,
    attached: Amount,
    recipient: Option<AccountAddress>,
) -> ReceiveResult<()> {
    let bidder = account_caller(ctx)?;

    // CCD bids carry the funds, token bids declare them and get pulled below
    let amount = match asset {
        PaymentAsset::Ccd => {
            ensure_eq!(declared, 0, CustomContractError::WrongPaymentAsset.into());
            attached.micro_ccd
        }
        PaymentAsset::Token(_) => {
            ensure_eq!(
                attached,
                Amount::zero(),
                CustomContractError::WrongPaymentAsset.into()
            );
            declared
        }
    };

    let bid = Bid {
        bidder,
        amount,
        recipient,
    };
    let outcome = host
        .state_mut()
        .place_bid(&token, bid, asset, ctx.metadata().slot_time())?;

    logger.log(&SettlementEvents::bid(
        &token.contract,
        &token.id,
        &bidder,
        amount,
    ))?;

    // Collect token funds only after all state changes
    if let PaymentAsset::Token(payment_contract) = asset {
        token::pull(host, &payment_contract, bidder, ctx.self_address(), amount)?;
    }

    match outcome {
        BidOutcome::Early { refund }
        | BidOutcome::Pending { refund }
        | BidOutcome::Live { refund } => refund_bid(ctx, host, logger, &token, asset, refund),
        BidOutcome::Settle { refund, settlement } => {
            refund_bid(ctx, host, logger, &token, asset, refund)?;
            payout::execute(host, ctx.self_address(), settlement, logger)
        }
    }
}

fn refund_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
    token: &Token,
    asset: PaymentAsset,
    refund: Option<Bid>,
) -> ReceiveResult<()> {
    if let Some(bid) = refund {
        logger.log(&SettlementEvents::bid_refund(
            &token.contract,
            &token.id,
            &bid.bidder,
            bid.amount,
        ))?;
        payout::deliver_or_credit(
            host,
            ctx.self_address(),
            asset,
            &bid.bidder,
            bid.amount,
            logger,
        )?;
    }
    Ok(())
}

fn apply_update_outcome<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
    token: &Token,
    outcome: UpdateOutcome,
) -> ReceiveResult<()> {
    match outcome {
        UpdateOutcome::Unchanged | UpdateOutcome::Live => Ok(()),
        UpdateOutcome::VoidBid(bid, asset) => {
            logger.log(&SettlementEvents::bid_refund(
                &token.contract,
                &token.id,
                &bid.bidder,
                bid.amount,
            ))?;
            payout::deliver_or_credit(
                host,
                ctx.self_address(),
                asset,
                &bid.bidder,
                bid.amount,
                logger,
            )
        }
        UpdateOutcome::Settle(settlement) => {
            payout::execute(host, ctx.self_address(), settlement, logger)
        }
    }
}

fn withdraw_listing<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let token = Token::deserial(&mut ctx.parameter_cursor())?;
    let sender = account_caller(ctx)?;

    let (terms, void) = host.state_mut().withdraw_listing(&token, sender)?;

    logger.log(&SettlementEvents::cancel(
        &token.contract,
        &token.id,
        &terms.seller,
    ))?;

    // Return the tokens
    nft::release(
        host,
        &token.contract,
        token.id.clone(),
        ctx.self_address(),
        terms.seller,
    )?;
    for id in terms.batch {
        nft::release(host, &token.contract, id, ctx.self_address(), terms.seller)?;
    }

    refund_bid(ctx, host, logger, &token, terms.asset, void)
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::*;
    use commons::{BasisPoints, FeeShare};
    use concordium_cis1::{AdditionalData, Receiver, TransferParams};
    use test_infrastructure::*;

    const NFT_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const PAYMENT_CONTRACT: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };
    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 10,
        subindex: 0,
    };

    const SELLER: AccountAddress = AccountAddress([1; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([2; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([3; 32]);
    const RECIPIENT: AccountAddress = AccountAddress([4; 32]);
    const ARTIST: AccountAddress = AccountAddress([5; 32]);
    const PLATFORM: AccountAddress = AccountAddress([6; 32]);

    const DAY_MILLIS: u64 = 86_400_000;

    fn token() -> Token {
        Token {
            contract: NFT_CONTRACT,
            id: TokenIdVec(vec![1]),
        }
    }

    fn ccd(micro: u64) -> Amount {
        Amount::from_micro_ccd(micro)
    }

    fn default_host() -> TestHost<State<TestStateApi>> {
        let ctx = TestInitContext::empty();
        let mut state_builder = TestStateBuilder::new();
        let state =
            contract_init(&ctx, &mut state_builder).expect_report("Failed to initialize contract");
        let mut host = TestHost::new(state, state_builder);
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_ok_mock::<TransferParams<TokenIdVec>, _, _>(()),
        );
        host
    }

    fn receive_ctx(
        sender: AccountAddress,
        time_millis: u64,
        parameter: &[u8],
    ) -> TestReceiveContext {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender))
            .set_self_address(SELF_ADDRESS)
            .set_metadata_slot_time(Timestamp::from_timestamp_millis(time_millis))
            .set_parameter(parameter);
        ctx
    }

    fn auction_params(min_price: AssetAmount) -> CreateAuctionParams {
        CreateAuctionParams {
            token: token(),
            batch: Vec::new(),
            asset: PaymentAsset::Ccd,
            min_price,
            buy_now_price: None,
            bid_period: None,
            bid_increase: None,
            fees: Vec::new(),
        }
    }

    fn sale_params(price: AssetAmount) -> CreateSaleParams {
        CreateSaleParams {
            token: token(),
            batch: Vec::new(),
            asset: PaymentAsset::Ccd,
            price,
            whitelisted_buyer: None,
            fees: Vec::new(),
        }
    }

    fn create_auction(
        host: &mut TestHost<State<TestStateApi>>,
        params: &CreateAuctionParams,
        time_millis: u64,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(params);
        let ctx = receive_ctx(SELLER, time_millis, &bytes);
        let mut logger = TestLogger::init();
        contract_create_auction(&ctx, host, &mut logger)
    }

    fn create_sale(
        host: &mut TestHost<State<TestStateApi>>,
        params: &CreateSaleParams,
        time_millis: u64,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(params);
        let ctx = receive_ctx(SELLER, time_millis, &bytes);
        let mut logger = TestLogger::init();
        contract_create_sale(&ctx, host, &mut logger)
    }

    fn bid_ccd(
        host: &mut TestHost<State<TestStateApi>>,
        bidder: AccountAddress,
        amount: AssetAmount,
        time_millis: u64,
    ) -> ReceiveResult<()> {
        let params = BidParams {
            token: token(),
            asset: PaymentAsset::Ccd,
            amount: 0,
        };
        let bytes = to_bytes(&params);
        let ctx = receive_ctx(bidder, time_millis, &bytes);
        let mut logger = TestLogger::init();
        contract_bid(&ctx, host, ccd(amount), &mut logger)
    }

    fn bid_token(
        host: &mut TestHost<State<TestStateApi>>,
        bidder: AccountAddress,
        amount: AssetAmount,
        time_millis: u64,
    ) -> ReceiveResult<()> {
        let params = BidParams {
            token: token(),
            asset: PaymentAsset::Token(PAYMENT_CONTRACT),
            amount,
        };
        let bytes = to_bytes(&params);
        let ctx = receive_ctx(bidder, time_millis, &bytes);
        let mut logger = TestLogger::init();
        contract_bid(&ctx, host, Amount::zero(), &mut logger)
    }

    fn listed_record(host: &TestHost<State<TestStateApi>>) -> crate::state::ListingData {
        match host.state().view_record(&token()) {
            Some(RecordState::Listed(data)) => data,
            _ => fail!("Expected a listed record"),
        }
    }

    #[concordium_test]
    fn test_init() {
        let ctx = TestInitContext::empty();
        let mut state_builder = TestStateBuilder::new();
        let state =
            contract_init(&ctx, &mut state_builder).expect_report("Failed to initialize contract");
        claim_eq!(state.view_record(&token()), None);
        claim_eq!(state.view_credits(&SELLER), Vec::new());
    }

    #[concordium_test]
    fn test_create_auction_lists_and_deposits() {
        let mut host = default_host();

        // The deposit must pull the tokens from the seller into the contract
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<TokenIdVec>, _, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.from == Address::Account(SELLER)
                        && matches!(
                            &transfer.to,
                            Receiver::Contract(address, _) if *address == SELF_ADDRESS
                        )
                },
                (),
            ),
        );

        let mut params = auction_params(10_000);
        params.batch = vec![TokenIdVec(vec![2])];
        let result = create_auction(&mut host, &params, 0);
        claim_eq!(result, Ok(()));

        let data = listed_record(&host);
        claim_eq!(data.terms.seller, SELLER);
        claim_eq!(data.terms.bid_increase, DEFAULT_BID_INCREASE);
        claim_eq!(data.terms.bid_period, DEFAULT_BID_PERIOD);
        claim_eq!(data.end, None);

        claim_eq!(host.state().owner_of(&token()), Ok(SELLER));
        claim_eq!(
            host.state().owner_of(&Token {
                contract: NFT_CONTRACT,
                id: TokenIdVec(vec![2]),
            }),
            Ok(SELLER)
        );
    }

    #[concordium_test]
    fn test_create_auction_rejects_low_increase() {
        let mut host = default_host();

        let mut params = auction_params(10_000);
        params.bid_increase = Some(BasisPoints::new(400));
        let result = create_auction(&mut host, &params, 0);
        claim_eq!(
            result,
            Err(CustomContractError::IncreaseBelowFloor.into())
        );

        params.bid_increase = Some(BasisPoints::new(1_000));
        let result = create_auction(&mut host, &params, 0);
        claim_eq!(result, Ok(()));
    }

    #[concordium_test]
    fn test_create_auction_rejects_excessive_fees() {
        let mut host = default_host();

        let mut params = auction_params(10_000);
        params.fees = vec![
            FeeShare {
                account: ARTIST,
                rate: BasisPoints::new(9_000),
            },
            FeeShare {
                account: PLATFORM,
                rate: BasisPoints::new(1_001),
            },
        ];
        let result = create_auction(&mut host, &params, 0);
        claim_eq!(result, Err(CustomContractError::FeeTotalExceeded.into()));
    }

    #[concordium_test]
    fn test_outbid_refunds_previous_bidder() {
        let mut host = default_host();
        create_auction(&mut host, &auction_params(10_000), 0)
            .expect_report("Failed to create auction");

        host.set_self_balance(ccd(10_000));
        let result = bid_ccd(&mut host, BIDDER_1, 10_000, 10);
        claim_eq!(result, Ok(()));

        let data = listed_record(&host);
        claim_eq!(
            data.end,
            Some(Timestamp::from_timestamp_millis(10 + DAY_MILLIS))
        );

        host.set_self_balance(ccd(10_000 + 10_100));
        let result = bid_ccd(&mut host, BIDDER_2, 10_100, 20);
        claim_eq!(result, Ok(()));

        // Previous bid went back in the same operation
        claim!(host.transfer_occurred(&BIDDER_1, ccd(10_000)));

        // The deadline rolled forward
        let data = listed_record(&host);
        claim_eq!(
            data.end,
            Some(Timestamp::from_timestamp_millis(20 + DAY_MILLIS))
        );
    }

    #[concordium_test]
    fn test_bid_below_raise_rejected() {
        let mut host = default_host();
        create_auction(&mut host, &auction_params(10_000), 0)
            .expect_report("Failed to create auction");
        host.set_self_balance(ccd(100_000));
        bid_ccd(&mut host, BIDDER_1, 10_000, 10).expect_report("First bid failed");

        let result = bid_ccd(&mut host, BIDDER_2, 10_099, 20);
        claim_eq!(result, Err(CustomContractError::BidTooLow.into()));
    }

    #[concordium_test]
    fn test_buy_now_settles_with_fee_split() {
        let mut host = default_host();

        let mut params = sale_params(10_000);
        params.fees = vec![
            FeeShare {
                account: ARTIST,
                rate: BasisPoints::new(1_000),
            },
            FeeShare {
                account: PLATFORM,
                rate: BasisPoints::new(100),
            },
        ];
        create_sale(&mut host, &params, 0).expect_report("Failed to create sale");

        host.set_self_balance(ccd(10_000));
        let result = bid_ccd(&mut host, BIDDER_1, 10_000, 10);
        claim_eq!(result, Ok(()));

        // 10% to the artist, 1% to the platform, the rest to the seller
        claim!(host.transfer_occurred(&ARTIST, ccd(1_000)));
        claim!(host.transfer_occurred(&PLATFORM, ccd(100)));
        claim!(host.transfer_occurred(&SELLER, ccd(8_900)));

        claim_eq!(host.state().view_record(&token()), None);
        claim_eq!(
            host.state().owner_of(&token()),
            Err(CustomContractError::ItemNotDeposited)
        );
    }

    #[concordium_test]
    fn test_custom_bid_sends_tokens_to_recipient() {
        let mut host = default_host();
        create_sale(&mut host, &sale_params(10_000), 0).expect_report("Failed to create sale");

        // The settlement must hand the token over to the chosen recipient
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<TokenIdVec>, _, _>(
                |params| {
                    let transfer = &params.0[0];
                    matches!(
                        &transfer.to,
                        Receiver::Account(account) if *account == RECIPIENT
                    )
                },
                (),
            ),
        );

        let params = CustomBidParams {
            token: token(),
            asset: PaymentAsset::Ccd,
            amount: 0,
            recipient: RECIPIENT,
        };
        let bytes = to_bytes(&params);
        let ctx = receive_ctx(BIDDER_1, 10, &bytes);
        let mut logger = TestLogger::init();
        host.set_self_balance(ccd(10_000));
        let result = contract_custom_bid(&ctx, &mut host, ccd(10_000), &mut logger);
        claim_eq!(result, Ok(()));

        claim!(host.transfer_occurred(&SELLER, ccd(10_000)));
    }

    #[concordium_test]
    fn test_whitelisted_sale_flow() {
        let mut host = default_host();

        let mut params = sale_params(10_000);
        params.whitelisted_buyer = Some(BIDDER_1);
        create_sale(&mut host, &params, 0).expect_report("Failed to create sale");

        host.set_self_balance(ccd(100_000));

        let result = bid_ccd(&mut host, BIDDER_2, 10_000, 10);
        claim_eq!(result, Err(CustomContractError::OnlyWhitelistedBuyer.into()));

        let result = bid_ccd(&mut host, BIDDER_1, 9_999, 10);
        claim_eq!(result, Err(CustomContractError::BidTooLow.into()));

        let result = bid_ccd(&mut host, BIDDER_1, 10_000, 10);
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&SELLER, ccd(10_000)));
        claim_eq!(host.state().view_record(&token()), None);
    }

    #[concordium_test]
    fn test_update_whitelisted_buyer_voids_pending_bid() {
        let mut host = default_host();
        create_sale(&mut host, &sale_params(10_000), 0).expect_report("Failed to create sale");

        host.set_self_balance(ccd(5_000));
        bid_ccd(&mut host, BIDDER_1, 5_000, 10).expect_report("Pending bid failed");

        let params = UpdateWhitelistedBuyerParams {
            token: token(),
            buyer: Some(BIDDER_2),
        };
        let bytes = to_bytes(&params);
        let ctx = receive_ctx(SELLER, 20, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_update_whitelisted_buyer(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));

        claim!(host.transfer_occurred(&BIDDER_1, ccd(5_000)));
        claim_eq!(listed_record(&host).highest_bid, None);
    }

    #[concordium_test]
    fn test_settle_auction_timing() {
        let mut host = default_host();
        create_auction(&mut host, &auction_params(10_000), 0)
            .expect_report("Failed to create auction");
        host.set_self_balance(ccd(10_000));
        bid_ccd(&mut host, BIDDER_1, 10_000, 10).expect_report("Bid failed");

        let bytes = to_bytes(&token());
        let ctx = receive_ctx(BIDDER_2, 10 + DAY_MILLIS - 1, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_settle_auction(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::AuctionStillActive.into()));

        // Anyone can settle once the deadline passed
        let ctx = receive_ctx(BIDDER_2, 10 + DAY_MILLIS, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_settle_auction(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&SELLER, ccd(10_000)));
        claim_eq!(host.state().view_record(&token()), None);
    }

    #[concordium_test]
    fn test_take_highest_bid_settles_early() {
        let mut host = default_host();
        create_auction(&mut host, &auction_params(10_000), 0)
            .expect_report("Failed to create auction");
        host.set_self_balance(ccd(5_000));
        bid_ccd(&mut host, BIDDER_1, 5_000, 10).expect_report("Bid failed");

        let bytes = to_bytes(&token());
        let ctx = receive_ctx(SELLER, 20, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_take_highest_bid(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&SELLER, ccd(5_000)));
    }

    #[concordium_test]
    fn test_withdraw_auction_returns_tokens() {
        let mut host = default_host();
        let mut params = auction_params(10_000);
        params.batch = vec![TokenIdVec(vec![2])];
        create_auction(&mut host, &params, 0).expect_report("Failed to create auction");

        // Returns must target the seller
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<TokenIdVec>, _, _>(
                |params| {
                    let transfer = &params.0[0];
                    matches!(
                        &transfer.to,
                        Receiver::Account(account) if *account == SELLER
                    )
                },
                (),
            ),
        );

        let bytes = to_bytes(&token());
        let ctx = receive_ctx(SELLER, 10, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_withdraw_auction(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));

        claim_eq!(host.state().view_record(&token()), None);
        claim_eq!(
            host.state().owner_of(&token()),
            Err(CustomContractError::ItemNotDeposited)
        );
    }

    #[concordium_test]
    fn test_withdraw_auction_rejected_after_valid_bid() {
        let mut host = default_host();
        create_auction(&mut host, &auction_params(10_000), 0)
            .expect_report("Failed to create auction");
        host.set_self_balance(ccd(10_000));
        bid_ccd(&mut host, BIDDER_1, 10_000, 10).expect_report("Bid failed");

        let bytes = to_bytes(&token());
        let ctx = receive_ctx(SELLER, 20, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_withdraw_auction(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::AuctionHasValidBid.into()));
    }

    #[concordium_test]
    fn test_withdraw_bid_refunds() {
        let mut host = default_host();
        create_auction(&mut host, &auction_params(10_000), 0)
            .expect_report("Failed to create auction");
        host.set_self_balance(ccd(5_000));
        bid_ccd(&mut host, BIDDER_1, 5_000, 10).expect_report("Bid failed");

        let bytes = to_bytes(&token());
        let ctx = receive_ctx(BIDDER_2, 20, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_withdraw_bid(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::OnlyHighestBidder.into()));

        let ctx = receive_ctx(BIDDER_1, 20, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_withdraw_bid(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&BIDDER_1, ccd(5_000)));
    }

    #[concordium_test]
    fn test_failed_payout_credits_exactly_once() {
        let mut host = default_host();
        create_sale(&mut host, &sale_params(10_000), 0).expect_report("Failed to create sale");

        // Not enough balance to pay the seller: the sale still goes through
        // and the payment lands in the credit ledger
        let result = bid_ccd(&mut host, BIDDER_1, 10_000, 10);
        claim_eq!(result, Ok(()));
        claim_eq!(host.state().view_record(&token()), None);
        claim_eq!(
            host.state().view_credits(&SELLER),
            vec![Credit {
                asset: PaymentAsset::Ccd,
                amount: 10_000,
            }]
        );

        let bytes = to_bytes(&());
        let ctx = receive_ctx(SELLER, 20, &bytes);
        let mut logger = TestLogger::init();
        host.set_self_balance(ccd(10_000));
        let result = contract_withdraw_all_failed_credits(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&SELLER, ccd(10_000)));

        // Nothing left to withdraw
        let mut logger = TestLogger::init();
        let result = contract_withdraw_all_failed_credits(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::NoCredits.into()));
    }

    #[concordium_test]
    fn test_buy_now_delivers_whole_batch() {
        let mut host = default_host();

        let mut params = sale_params(10_000);
        params.batch = vec![TokenIdVec(vec![2]), TokenIdVec(vec![3])];
        create_sale(&mut host, &params, 0).expect_report("Failed to create sale");

        // Every release must target the buyer; anything else traps and
        // aborts the settlement
        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<TokenIdVec>, _, _>(
                |params| {
                    let transfer = &params.0[0];
                    matches!(
                        &transfer.to,
                        Receiver::Account(account) if *account == BIDDER_1
                    )
                },
                (),
            ),
        );

        host.set_self_balance(ccd(10_000));
        let result = bid_ccd(&mut host, BIDDER_1, 10_000, 10);
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&SELLER, ccd(10_000)));

        claim_eq!(host.state().view_record(&token()), None);
        for id in vec![vec![1], vec![2], vec![3]] {
            claim_eq!(
                host.state().owner_of(&Token {
                    contract: NFT_CONTRACT,
                    id: TokenIdVec(id),
                }),
                Err(CustomContractError::ItemNotDeposited)
            );
        }
    }

    #[concordium_test]
    fn test_failed_token_payout_lands_in_credits() {
        let mut host = default_host();

        let mut params = auction_params(10_000);
        params.asset = PaymentAsset::Token(PAYMENT_CONTRACT);
        create_auction(&mut host, &params, 0).expect_report("Failed to create auction");

        host.setup_mock_entrypoint(
            PAYMENT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_ok_mock::<TransferParams<TokenIdVec>, _, _>(()),
        );
        bid_token(&mut host, BIDDER_1, 10_000, 10).expect_report("Bid failed");

        // The payment contract rejects the payout push, so the seller share
        // must land in the credit ledger instead of failing the settlement
        host.setup_mock_entrypoint(
            PAYMENT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_reject_mock::<TransferParams<TokenIdVec>, _>(),
        );

        let bytes = to_bytes(&token());
        let ctx = receive_ctx(SELLER, 20, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_take_highest_bid(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim_eq!(host.state().view_record(&token()), None);
        claim_eq!(
            host.state().view_credits(&SELLER),
            vec![Credit {
                asset: PaymentAsset::Token(PAYMENT_CONTRACT),
                amount: 10_000,
            }]
        );

        // Once the payment contract cooperates the credits can be withdrawn
        host.setup_mock_entrypoint(
            PAYMENT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_ok_mock::<TransferParams<TokenIdVec>, _, _>(()),
        );
        let bytes = to_bytes(&());
        let ctx = receive_ctx(SELLER, 30, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_withdraw_all_failed_credits(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim_eq!(host.state().view_credits(&SELLER), Vec::new());
    }

    #[concordium_test]
    fn test_token_asset_bid_pulls_funds() {
        let mut host = default_host();

        let mut params = auction_params(10_000);
        params.asset = PaymentAsset::Token(PAYMENT_CONTRACT);
        create_auction(&mut host, &params, 0).expect_report("Failed to create auction");

        host.setup_mock_entrypoint(
            PAYMENT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<TokenIdVec>, _, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.amount == 10_000 && transfer.from == Address::Account(BIDDER_1)
                },
                (),
            ),
        );

        // CCD bids are not accepted on a token priced auction
        let result = bid_ccd(&mut host, BIDDER_1, 10_000, 10);
        claim_eq!(result, Err(CustomContractError::WrongPaymentAsset.into()));

        let result = bid_token(&mut host, BIDDER_1, 10_000, 10);
        claim_eq!(result, Ok(()));
        claim!(listed_record(&host).end.is_some());
    }

    #[concordium_test]
    fn test_early_bid_goes_live_on_matching_auction() {
        let mut host = default_host();

        host.set_self_balance(ccd(9_000));
        let result = bid_ccd(&mut host, BIDDER_1, 9_000, 0);
        claim_eq!(result, Ok(()));
        claim_eq!(
            host.state().view_record(&token()),
            Some(RecordState::EarlyBid(Bid {
                bidder: BIDDER_1,
                amount: 9_000,
                recipient: None,
            }))
        );

        create_auction(&mut host, &auction_params(8_000), 10)
            .expect_report("Failed to create auction");

        let data = listed_record(&host);
        claim_eq!(
            data.highest_bid,
            Some(Bid {
                bidder: BIDDER_1,
                amount: 9_000,
                recipient: None,
            })
        );
        claim_eq!(
            data.end,
            Some(Timestamp::from_timestamp_millis(10 + DAY_MILLIS))
        );
    }

    #[concordium_test]
    fn test_early_bid_voided_on_token_priced_listing() {
        let mut host = default_host();

        host.set_self_balance(ccd(9_000));
        bid_ccd(&mut host, BIDDER_1, 9_000, 0).expect_report("Early bid failed");

        let mut params = auction_params(8_000);
        params.asset = PaymentAsset::Token(PAYMENT_CONTRACT);
        let result = create_auction(&mut host, &params, 10);
        claim_eq!(result, Ok(()));

        // The held CCD bid cannot pay a token priced auction
        claim!(host.transfer_occurred(&BIDDER_1, ccd(9_000)));
        claim_eq!(listed_record(&host).highest_bid, None);
    }

    #[concordium_test]
    fn test_on_cis1_received_requires_contract() {
        let host = default_host();

        let params = OnReceivingCis1Params {
            token_id: TokenIdVec(vec![1]),
            amount: 1,
            from: Address::Account(SELLER),
            contract_name: OwnedContractName::new_unchecked("init_NftSettlement".into()),
            data: AdditionalData::empty(),
        };
        let bytes = to_bytes(&params);

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Contract(NFT_CONTRACT))
            .set_parameter(&bytes);
        let result = contract_on_cis1_received(&ctx, &host);
        claim_eq!(result, Ok(()));

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(SELLER)).set_parameter(&bytes);
        let result = contract_on_cis1_received(&ctx, &host);
        claim_eq!(result, Err(CustomContractError::ContractOnly.into()));
    }

    #[concordium_test]
    fn test_views() {
        let mut host = default_host();
        create_auction(&mut host, &auction_params(10_000), 0)
            .expect_report("Failed to create auction");

        let bytes = to_bytes(&token());
        let ctx = receive_ctx(BIDDER_1, 10, &bytes);
        let record = contract_get_auction_record(&ctx, &host).expect_report("View failed");
        claim!(matches!(record, Some(RecordState::Listed(_))));

        let owner = contract_owner_of_item(&ctx, &host).expect_report("View failed");
        claim_eq!(owner, SELLER);

        let unknown = Token {
            contract: NFT_CONTRACT,
            id: TokenIdVec(vec![9]),
        };
        let bytes = to_bytes(&unknown);
        let ctx = receive_ctx(BIDDER_1, 10, &bytes);
        let record = contract_get_auction_record(&ctx, &host).expect_report("View failed");
        claim_eq!(record, None);
        let result = contract_owner_of_item(&ctx, &host);
        claim_eq!(result, Err(CustomContractError::ItemNotDeposited.into()));
    }
}
