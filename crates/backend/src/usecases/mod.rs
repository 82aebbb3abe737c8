pub mod u501_amazon_financial_sync;
