use std::io::{self, Write};

use clap::{Args, Subcommand};
use marketplace::{
    cart::CartAggregate,
    checkout::{self, CheckoutQuote, DeliverySelections},
    ids::ShopUuid,
    orders::DeliveryOption,
    pricing::format_minor,
};
use marketplace_app::domain::carts::CartsService;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

#[derive(Debug, Args)]
pub(crate) struct CheckoutCommand {
    #[command(subcommand)]
    command: CheckoutSubcommand,
}

#[derive(Debug, Subcommand)]
enum CheckoutSubcommand {
    /// Price the cart without placing an order
    Quote(QuoteArgs),
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// Override a shop's delivery choice, e.g. `<shop>=delivery`
    #[arg(long = "delivery", value_parser = parse_selection)]
    selections: Vec<(ShopUuid, DeliveryOption)>,
}

pub(crate) fn run(command: CheckoutCommand, carts: &CartsService) -> Result<(), String> {
    match command.command {
        CheckoutSubcommand::Quote(args) => {
            let cart = carts.snapshot();
            let mut selections = DeliverySelections::with_defaults(&cart);

            for (shop, option) in args.selections {
                if cart.shop(shop).is_none() {
                    return Err(format!("shop {shop} is not in the cart"));
                }

                selections.select(shop, option);
            }

            let quote =
                checkout::quote(&cart, &selections).map_err(|error| error.to_string())?;

            write_quote(&mut io::stdout().lock(), &cart, &quote)
                .map_err(|error| format!("failed to print quote: {error}"))
        }
    }
}

fn parse_selection(value: &str) -> Result<(ShopUuid, DeliveryOption), String> {
    let (shop, option) = value
        .split_once('=')
        .ok_or_else(|| format!("expected <shop>=<pickup|delivery>, got `{value}`"))?;

    let shop = shop
        .trim()
        .parse()
        .map_err(|error| format!("invalid shop id `{shop}`: {error}"))?;

    let option = match option.trim() {
        "pickup" => DeliveryOption::Pickup,
        "delivery" => DeliveryOption::Delivery,
        other => return Err(format!("unknown delivery option `{other}`")),
    };

    Ok((shop, option))
}

fn write_quote(
    out: &mut impl Write,
    cart: &CartAggregate,
    quote: &CheckoutQuote,
) -> io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "cart is empty");
    }

    let mut builder = Builder::default();

    builder.push_record(["Shop", "Option", "Subtotal", "Tax", "Delivery", "Total"]);

    for (shop, fees) in cart.iter().zip(&quote.shops) {
        builder.push_record([
            shop.shop_name().to_string(),
            fees.delivery_option
                .map_or_else(|| "unset".to_string(), |option| option.to_string()),
            format_minor(fees.subtotal),
            format_minor(fees.tax),
            format_minor(fees.delivery_fee),
            format_minor(fees.total),
        ]);
    }

    builder.push_record([
        "All shops".to_string(),
        String::new(),
        format_minor(quote.subtotal),
        format_minor(quote.tax),
        format_minor(quote.delivery_fee),
        format_minor(quote.total),
    ]);

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(2..6), Alignment::right());

    writeln!(out, "{table}")
}

#[cfg(test)]
mod tests {
    use marketplace::{
        cart::{CartItem, ShopMeta},
        ids::ItemUuid,
    };
    use testresult::TestResult;

    use super::*;

    #[test]
    fn selection_parses_shop_and_option() -> TestResult {
        let shop = ShopUuid::now_v7();

        assert_eq!(
            parse_selection(&format!("{shop}=delivery"))?,
            (shop, DeliveryOption::Delivery)
        );
        assert!(parse_selection(&format!("{shop}=drone")).is_err(), "unknown option");
        assert!(parse_selection("pickup").is_err(), "missing shop");

        Ok(())
    }

    #[test]
    fn quote_table_shows_grand_total() -> TestResult {
        let mut cart = CartAggregate::new();
        let shop = ShopUuid::now_v7();

        cart.add_to_cart(
            CartItem::new(ItemUuid::now_v7(), "Jam", 5_00, 2),
            shop,
            "Hive",
            ShopMeta {
                photo_url: None,
                allow_pickup: false,
                local_delivery: true,
            },
        )?;

        let selections = DeliverySelections::with_defaults(&cart);
        let quote = checkout::quote(&cart, &selections)?;
        let mut out = Vec::new();

        write_quote(&mut out, &cart, &quote)?;

        let printed = String::from_utf8(out)?;

        assert!(printed.contains("delivery"), "missing option: {printed}");
        assert!(printed.contains("$14.79"), "missing total: {printed}");

        Ok(())
    }
}
