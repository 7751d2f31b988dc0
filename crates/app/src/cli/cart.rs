use std::io::{self, Write};

use clap::{Args, Subcommand};
use marketplace::{
    cart::{CartAggregate, CartItem, ShopMeta},
    ids::{ItemUuid, ShopUuid},
    pricing::format_minor,
};
use marketplace_app::domain::carts::CartsService;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Print the cart
    Show,

    /// Add an item, merging with an existing line for the same item
    Add(AddArgs),

    /// Remove an item
    Remove(LineArgs),

    /// Set an item's quantity; zero removes it
    SetQuantity(SetQuantityArgs),

    /// Empty the cart, or one shop's part of it
    Clear(ClearArgs),
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Shop selling the item
    #[arg(long)]
    shop: ShopUuid,

    /// Shop display name
    #[arg(long)]
    shop_name: String,

    /// Catalogue item
    #[arg(long)]
    item: ItemUuid,

    /// Item display name
    #[arg(long)]
    name: String,

    /// Unit price in cents
    #[arg(long)]
    price: u64,

    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// The shop does not offer pickup
    #[arg(long)]
    no_pickup: bool,

    /// The shop offers local delivery
    #[arg(long)]
    local_delivery: bool,

    /// The price is open to negotiation
    #[arg(long)]
    negotiable: bool,
}

#[derive(Debug, Args)]
struct LineArgs {
    #[arg(long)]
    shop: ShopUuid,

    #[arg(long)]
    item: ItemUuid,
}

#[derive(Debug, Args)]
struct SetQuantityArgs {
    #[command(flatten)]
    line: LineArgs,

    #[arg(long)]
    quantity: u32,
}

#[derive(Debug, Args)]
struct ClearArgs {
    /// Only clear this shop
    #[arg(long)]
    shop: Option<ShopUuid>,
}

pub(crate) fn run(command: CartCommand, carts: &CartsService) -> Result<(), String> {
    let changed = match command.command {
        CartSubcommand::Show => {
            return write_cart(&mut io::stdout().lock(), &carts.snapshot())
                .map_err(|error| format!("failed to print cart: {error}"));
        }
        CartSubcommand::Add(args) => {
            let mut item = CartItem::new(args.item, args.name, args.price, args.quantity);

            item.negotiable = args.negotiable;

            carts
                .add_to_cart(
                    item,
                    args.shop,
                    args.shop_name,
                    ShopMeta {
                        photo_url: None,
                        allow_pickup: !args.no_pickup,
                        local_delivery: args.local_delivery,
                    },
                )
                .map_err(|error| format!("failed to add item: {error}"))?
        }
        CartSubcommand::Remove(line) => carts
            .remove_from_cart(line.shop, line.item)
            .map_err(|error| format!("failed to remove item: {error}"))?,
        CartSubcommand::SetQuantity(args) => carts
            .update_item_quantity(args.line.shop, args.line.item, args.quantity)
            .map_err(|error| format!("failed to update quantity: {error}"))?,
        CartSubcommand::Clear(ClearArgs { shop: Some(shop) }) => carts.clear_shop_cart(shop),
        CartSubcommand::Clear(ClearArgs { shop: None }) => carts.clear_cart(),
    };

    let mut out = io::stdout().lock();
    let status = if changed { "cart updated" } else { "cart unchanged" };

    writeln!(
        out,
        "{status}: {} items from {} shops, subtotal {}",
        carts.item_count(),
        carts.shop_count(),
        format_minor(carts.total_subtotal())
    )
    .map_err(|error| format!("failed to print cart: {error}"))
}

fn write_cart(out: &mut impl Write, cart: &CartAggregate) -> io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "cart is empty");
    }

    let mut builder = Builder::default();

    builder.push_record(["Shop", "Item", "Qty", "Price", "Line total"]);

    for shop in cart {
        for item in shop.items() {
            builder.push_record([
                shop.shop_name().to_string(),
                item.name.clone(),
                item.quantity.to_string(),
                format_minor(item.price),
                item.line_total().map_or_else(|error| error.to_string(), format_minor),
            ]);
        }
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(out, "Subtotal: {}", format_minor(cart.total_subtotal()))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn empty_cart_says_so() -> TestResult {
        let mut out = Vec::new();

        write_cart(&mut out, &CartAggregate::new())?;

        assert_eq!(String::from_utf8(out)?, "cart is empty\n");

        Ok(())
    }

    #[test]
    fn cart_table_lists_every_line() -> TestResult {
        let mut cart = CartAggregate::new();
        let meta = ShopMeta {
            photo_url: None,
            allow_pickup: true,
            local_delivery: false,
        };

        cart.add_to_cart(
            CartItem::new(ItemUuid::now_v7(), "Sourdough", 5_00, 2),
            ShopUuid::now_v7(),
            "Corner Bakery",
            meta.clone(),
        )?;
        cart.add_to_cart(
            CartItem::new(ItemUuid::now_v7(), "Honey", 8_50, 1),
            ShopUuid::now_v7(),
            "Hive",
            meta,
        )?;

        let mut out = Vec::new();

        write_cart(&mut out, &cart)?;

        let printed = String::from_utf8(out)?;

        assert!(printed.contains("Corner Bakery"), "missing bakery: {printed}");
        assert!(printed.contains("$10.00"), "missing line total: {printed}");
        assert!(printed.contains("Subtotal: $18.50"), "missing subtotal: {printed}");

        Ok(())
    }
}
