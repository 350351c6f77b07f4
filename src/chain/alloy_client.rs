use alloy::{
    network::Ethereum,
    primitives::{aliases::U24, Address, U256},
    providers::{Provider, RootProvider},
    rpc::types::TransactionRequest,
    sol,
};
use async_trait::async_trait;
use eyre::Result;

use super::{ChainClient, ReservesQuery};

sol!(
    #[sol(rpc)]
    contract UniswapQuery {
        function getPairsByIndexRange(
            address _uniswapFactory,
            address _uniswapFactoryV3,
            uint24[] calldata _feeTiers,
            uint256 _start,
            uint256 _stop
        ) external view returns (address[][] memory);

        function getReservesByPairs(
            address _quoter,
            address[] calldata _pairs,
            address _weth,
            address[] calldata _tokens,
            uint24[] calldata _feeTiers,
            bool[][] calldata _feeOns,
            uint256 _amountIn
        ) external returns (uint256[][] memory);
    }
);

/// Gas allowance for the lookup contract's `eth_call`s, which loop over many pairs
const QUERY_GAS: u64 = 30_000_000;

/// [`ChainClient`] over an alloy provider and the deployed lookup contract.
#[derive(Clone, Debug)]
pub struct AlloyChainClient {
    /// JSON-RPC provider
    provider: RootProvider<Ethereum>,
    /// Lookup contract address
    lookup: Address,
}

impl AlloyChainClient {
    /// Creates a client querying `lookup` through `provider`
    #[must_use]
    pub const fn new(provider: RootProvider<Ethereum>, lookup: Address) -> Self {
        Self { provider, lookup }
    }

    /// The underlying provider
    #[must_use]
    pub const fn provider(&self) -> &RootProvider<Ethereum> {
        &self.provider
    }
}

/// Fee tiers in the contract's `uint24` encoding
fn fee_tiers(fees: &[u32]) -> Vec<U24> {
    fees.iter().map(|fee| U24::from(*fee)).collect()
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn pairs_by_index_range(
        &self,
        factory: Address,
        v3_factory: Address,
        fee_tiers_in: &[u32],
        start: U256,
        stop: U256,
    ) -> Result<Vec<Vec<Address>>> {
        let query = UniswapQuery::new(self.lookup, &self.provider);
        Ok(query
            .getPairsByIndexRange(factory, v3_factory, fee_tiers(fee_tiers_in), start, stop)
            .gas(QUERY_GAS)
            .call()
            .await?
            ._0)
    }

    async fn reserves_by_pairs(&self, request: ReservesQuery) -> Result<Vec<Vec<U256>>> {
        let query = UniswapQuery::new(self.lookup, &self.provider);
        Ok(query
            .getReservesByPairs(
                request.quoter,
                request.pairs,
                request.native,
                request.tokens,
                fee_tiers(&request.fee_tiers),
                request.tiers_on,
                request.amount_in,
            )
            .gas(QUERY_GAS)
            .call()
            .await?
            ._0)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        Ok(self.provider.estimate_gas(tx).await?)
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }
}
